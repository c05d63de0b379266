//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the slash commands and the component/modal dispatcher
//! into a poise framework. Everything that touches storage lives in
//! [`crate::core`]; this layer only translates between Discord and it.

/// Slash command implementations (economy, clan, connect4, general)
pub mod commands;
/// Component and modal handlers plus message rendering
pub mod handlers;

use crate::{
    config::AppConfig,
    errors::{Error, ErrorCategory, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared data available to all bot commands.
/// This structure holds the database connection and the loaded settings.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Settings from config.toml
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance with the given database connection.
    #[must_use]
    pub const fn new(database: DatabaseConnection, config: Arc<AppConfig>) -> Self {
        Self { database, config }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Logs internal failures; the user only ever sees [`Error::user_message`].
pub fn log_failure(error: &Error, source: &str) {
    match error.category() {
        ErrorCategory::Internal | ErrorCategory::NotFound => {
            tracing::error!(source, error = %error, "Handler failed");
        }
        ErrorCategory::Validation | ErrorCategory::AlreadyHandled => {
            tracing::debug!(source, error = %error, "Request rejected");
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            log_failure(&error, &ctx.command().name);
            let reply = poise::CreateReply::default()
                .content(error.user_message())
                .ephemeral(error.is_ephemeral());
            if let Err(e) = ctx.send(reply).await {
                tracing::error!(error = %e, "Failed to send error message");
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!(error = %e, "Error while handling error");
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        handlers::components::handle_interaction(ctx, interaction, data).await;
    }
    Ok(())
}

/// Builds the framework and runs the client until it stops.
///
/// Commands are registered in `dev_guild` when given, globally otherwise.
#[instrument(skip(token, config, database))]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
    dev_guild: Option<serenity::GuildId>,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(event_handler(ctx, event, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(bot = %ready.user.name, guilds = ready.guilds.len(), "Logged in");
                if let Some(guild_id) = dev_guild {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                        .await?;
                    info!(guild = %guild_id, "Registered commands in guild");
                } else {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    info!("Registered commands globally");
                }
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS | serenity::GatewayIntents::GUILD_MESSAGES;

    info!("Starting bot client...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}
