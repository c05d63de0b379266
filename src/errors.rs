//! Unified error type for the bot.
//!
//! Domain failures are struct variants so handlers can match on them, storage
//! and framework failures convert in through `#[from]`. Every variant maps onto
//! one [`ErrorCategory`], which decides how the failure is shown to the user.

use crate::core::{amount::format_amount, connect4::Column};
use thiserror::Error;

/// How a failure is surfaced to the person who triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or a failed precondition; the user can fix it.
    Validation,
    /// The button, select or modal was already used or has expired.
    AlreadyHandled,
    /// A row that should exist is missing or a stored board no longer
    /// decodes; points at a data-integrity gap.
    NotFound,
    /// Storage, platform or configuration failure.
    Internal,
}

/// Every failure the bot can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Discord error: {0}")]
    Discord(Box<poise::serenity_prelude::Error>),

    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    #[error("Amount {amount} is below the minimum of {minimum}")]
    AmountTooSmall { amount: i64, minimum: i64 },

    #[error("Amount {amount} is above the maximum of {maximum}")]
    AmountTooLarge { amount: i64, maximum: i64 },

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    #[error("Wallet {id} not found")]
    WalletNotFound { id: i64 },

    #[error("Invalid recipient: {reason}")]
    InvalidRecipient { reason: String },

    #[error("Invalid column: {column}")]
    InvalidColumn { column: String },

    #[error("Column {column} is full")]
    ColumnFull { column: Column },

    #[error("Game has ended")]
    GameEnded,

    #[error("Game {id} not found")]
    GameNotFound { id: i64 },

    #[error("Game {id} changed before the update was applied")]
    StaleGame { id: i64 },

    #[error("User is not a player in this game")]
    NotAPlayer,

    #[error("Corrupt board: {reason}")]
    CorruptBoard { reason: String },

    #[error("User is not in a clan")]
    NotInClan,

    #[error("User is already in a clan")]
    AlreadyInClan,

    #[error("Clan {id} not found")]
    ClanNotFound { id: i64 },

    #[error("Leader cannot leave a clan with other members")]
    LeaderCannotLeave,

    #[error("Invalid clan name: {reason}")]
    InvalidClanName { reason: String },

    #[error("Interaction {id} not found")]
    InteractionNotFound { id: String },

    #[error("Interaction {id} was already consumed")]
    InteractionConsumed { id: i64 },

    #[error("Interaction {id} has expired")]
    InteractionExpired { id: i64 },

    #[error("Interaction belongs to another user")]
    NotYourInteraction,

    #[error("Interaction belongs to another guild")]
    WrongGuild,

    #[error("Wrong interaction type, expected {expected}")]
    WrongInteractionType { expected: String },

    #[error("Invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("Command is on cooldown until {until}")]
    OnCooldown { until: chrono::DateTime<chrono::Utc> },

    #[error("Command is not allowed in this channel")]
    WrongChannel,

    #[error("Unknown item: {item}")]
    UnknownItem { item: String },

    #[error("Item not owned: {item}")]
    ItemNotOwned { item: String },

    #[error("Command can only be used in a server")]
    GuildOnly,
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

impl Error {
    /// Classifies the error for presentation.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidAmount { .. }
            | Self::AmountTooSmall { .. }
            | Self::AmountTooLarge { .. }
            | Self::InsufficientFunds { .. }
            | Self::InvalidRecipient { .. }
            | Self::InvalidColumn { .. }
            | Self::ColumnFull { .. }
            | Self::GameEnded
            | Self::NotAPlayer
            | Self::NotInClan
            | Self::AlreadyInClan
            | Self::LeaderCannotLeave
            | Self::InvalidClanName { .. }
            | Self::NotYourInteraction
            | Self::WrongGuild
            | Self::WrongInteractionType { .. }
            | Self::OnCooldown { .. }
            | Self::WrongChannel
            | Self::UnknownItem { .. }
            | Self::ItemNotOwned { .. }
            | Self::InvalidPayload { .. }
            | Self::GuildOnly => ErrorCategory::Validation,
            Self::InteractionConsumed { .. }
            | Self::InteractionExpired { .. }
            | Self::StaleGame { .. } => ErrorCategory::AlreadyHandled,
            Self::WalletNotFound { .. }
            | Self::GameNotFound { .. }
            | Self::ClanNotFound { .. }
            | Self::InteractionNotFound { .. }
            | Self::CorruptBoard { .. } => ErrorCategory::NotFound,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Discord(_) => ErrorCategory::Internal,
        }
    }

    /// Text shown to the user who triggered the failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount { .. } => {
                "Invalid amount. Use positive integers only. Example: `50k`".to_string()
            }
            Self::AmountTooSmall { minimum, .. } => {
                format!("You can't use less than {}.", format_amount(*minimum))
            }
            Self::AmountTooLarge { maximum, .. } => {
                format!("You can't use more than {}.", format_amount(*maximum))
            }
            Self::InsufficientFunds { .. } => {
                "You don't have enough money in your wallet for this.".to_string()
            }
            Self::InvalidRecipient { reason } | Self::InvalidClanName { reason } => reason.clone(),
            Self::InvalidColumn { .. } => "Invalid column. Contact developers.".to_string(),
            Self::ColumnFull { column } => format!("Column {column} is full."),
            Self::GameEnded => "This game has ended.".to_string(),
            Self::NotAPlayer => "You are not a player in this game.".to_string(),
            Self::NotInClan => "You are not in a clan.".to_string(),
            Self::AlreadyInClan => "You are already a member of a clan.".to_string(),
            Self::LeaderCannotLeave => {
                "You cannot leave the clan as the leader with other members in the clan. \
                 If you want to leave the clan, you must first transfer leadership to another \
                 member or kick everyone in the clan."
                    .to_string()
            }
            Self::NotYourInteraction => "This interaction is not meant for you.".to_string(),
            Self::WrongGuild => "This interaction belongs to another server.".to_string(),
            Self::WrongInteractionType { expected } => {
                format!("This interaction is only available as {expected}.")
            }
            Self::OnCooldown { until } => format!("Try again <t:{}:R>", until.timestamp()),
            Self::WrongChannel => "Economy commands can't be used in this channel.".to_string(),
            Self::UnknownItem { item } => format!("Unknown item `{item}`."),
            Self::ItemNotOwned { item } => format!("You don't own any `{item}`."),
            Self::GuildOnly => "This command can only be used in a server.".to_string(),
            Self::InteractionConsumed { .. } => {
                "This interaction has already been handled.".to_string()
            }
            Self::InteractionExpired { .. } => "This interaction has expired.".to_string(),
            Self::StaleGame { .. } => {
                "The board changed before your move went through.".to_string()
            }
            Self::WalletNotFound { .. } => "Wallet not found. Contact developers.".to_string(),
            Self::GameNotFound { .. } => "Game not found. Contact developers.".to_string(),
            Self::ClanNotFound { .. } => "Clan not found. Contact developers.".to_string(),
            Self::InteractionNotFound { .. } => {
                "Interaction not found. Contact developers.".to_string()
            }
            Self::InvalidPayload { .. } => "Invalid context. Contact developers.".to_string(),
            Self::CorruptBoard { .. } => "Failed to parse board. Contact developers.".to_string(),
            Self::Config { .. }
            | Self::Database(_)
            | Self::Json(_)
            | Self::Toml(_)
            | Self::Io(_)
            | Self::EnvVar(_)
            | Self::Discord(_) => "An error occurred. Contact support.".to_string(),
        }
    }

    /// Whether the reply should only be visible to the acting user.
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        !matches!(self.category(), ErrorCategory::AlreadyHandled)
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
