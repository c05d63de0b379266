//! Pending interactions - single-use tokens behind buttons, selects and modals.
//!
//! Every component the bot sends carries the id of an `interactions` row as its
//! custom id. The row records who may use it, in which guild, and what it is
//! for ([`PendingAction`]). Using a token sets `consumed_at` with a conditional
//! update, so of two racing clicks exactly one wins.

use crate::{
    entities::{Interaction, interaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

/// Stored kind tag of a pending interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    ClanCreate,
    ClanCreateWizardCancel,
    ClanCreatePromptName,
    Connect4Accept,
    Connect4Decline,
    Connect4Move,
    Connect4Forfeit,
    ShopBuyToolMenu,
    ShopSellToolMenu,
}

/// Kinds belonging to the clan creation wizard.
pub const CLAN_WIZARD_KINDS: [InteractionKind; 3] = [
    InteractionKind::ClanCreate,
    InteractionKind::ClanCreateWizardCancel,
    InteractionKind::ClanCreatePromptName,
];

/// Kinds attached to a running game's board message.
pub const CONNECT4_GAME_KINDS: [InteractionKind; 2] =
    [InteractionKind::Connect4Move, InteractionKind::Connect4Forfeit];

/// Kinds attached to an open challenge.
pub const CONNECT4_CHALLENGE_KINDS: [InteractionKind; 2] =
    [InteractionKind::Connect4Accept, InteractionKind::Connect4Decline];

impl InteractionKind {
    const ALL: [Self; 9] = [
        Self::ClanCreate,
        Self::ClanCreateWizardCancel,
        Self::ClanCreatePromptName,
        Self::Connect4Accept,
        Self::Connect4Decline,
        Self::Connect4Move,
        Self::Connect4Forfeit,
        Self::ShopBuyToolMenu,
        Self::ShopSellToolMenu,
    ];

    /// Storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClanCreate => "CLAN_CREATE",
            Self::ClanCreateWizardCancel => "CLAN_CREATE_WIZARD_CANCEL",
            Self::ClanCreatePromptName => "CLAN_CREATE_PROMPT_NAME",
            Self::Connect4Accept => "CONNECT4_ACCEPT",
            Self::Connect4Decline => "CONNECT4_DECLINE",
            Self::Connect4Move => "CONNECT4_MOVE",
            Self::Connect4Forfeit => "CONNECT4_FORFEIT",
            Self::ShopBuyToolMenu => "SHOP_BUY_TOOL_MENU",
            Self::ShopSellToolMenu => "SHOP_SELL_TOOL_MENU",
        }
    }

    /// Parses a storage tag.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of the name prompt: where the wizard message lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardMessagePayload {
    pub wizard_message_id: String,
}

/// Payload of a game's move and forfeit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    pub game_id: i64,
}

/// Payload of an open challenge. Both buttons of one challenge share
/// `challenge_key`; no other challenge does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    pub challenge_key: String,
    pub challenger_id: String,
    pub opponent_id: String,
    pub wager: i64,
}

/// Payload of a shop menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopMenuPayload {
    pub wallet_id: i64,
}

/// What a pending interaction does, decoded from its kind and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    ClanCreate,
    ClanCreateWizardCancel,
    ClanCreatePromptName(WizardMessagePayload),
    Connect4Accept(ChallengePayload),
    Connect4Decline(ChallengePayload),
    Connect4Move(GamePayload),
    Connect4Forfeit(GamePayload),
    ShopBuyToolMenu(ShopMenuPayload),
    ShopSellToolMenu(ShopMenuPayload),
}

impl PendingAction {
    /// Kind tag stored alongside the payload.
    #[must_use]
    pub const fn kind(&self) -> InteractionKind {
        match self {
            Self::ClanCreate => InteractionKind::ClanCreate,
            Self::ClanCreateWizardCancel => InteractionKind::ClanCreateWizardCancel,
            Self::ClanCreatePromptName(_) => InteractionKind::ClanCreatePromptName,
            Self::Connect4Accept(_) => InteractionKind::Connect4Accept,
            Self::Connect4Decline(_) => InteractionKind::Connect4Decline,
            Self::Connect4Move(_) => InteractionKind::Connect4Move,
            Self::Connect4Forfeit(_) => InteractionKind::Connect4Forfeit,
            Self::ShopBuyToolMenu(_) => InteractionKind::ShopBuyToolMenu,
            Self::ShopSellToolMenu(_) => InteractionKind::ShopSellToolMenu,
        }
    }

    /// Serializes the payload; kinds without one store `NULL`.
    pub fn encode_payload(&self) -> Result<Option<String>> {
        let json = match self {
            Self::ClanCreate | Self::ClanCreateWizardCancel => return Ok(None),
            Self::ClanCreatePromptName(p) => serde_json::to_string(p)?,
            Self::Connect4Accept(p) | Self::Connect4Decline(p) => serde_json::to_string(p)?,
            Self::Connect4Move(p) | Self::Connect4Forfeit(p) => serde_json::to_string(p)?,
            Self::ShopBuyToolMenu(p) | Self::ShopSellToolMenu(p) => serde_json::to_string(p)?,
        };
        Ok(Some(json))
    }

    /// Decodes a stored kind and payload. Unknown kinds and payloads that do
    /// not fit the kind are [`Error::InvalidPayload`].
    pub fn decode(kind: &str, payload: Option<&str>) -> Result<Self> {
        let parsed = InteractionKind::parse(kind).ok_or_else(|| Error::InvalidPayload {
            kind: kind.to_string(),
            reason: "unknown interaction kind".to_string(),
        })?;

        Ok(match parsed {
            InteractionKind::ClanCreate => Self::ClanCreate,
            InteractionKind::ClanCreateWizardCancel => Self::ClanCreateWizardCancel,
            InteractionKind::ClanCreatePromptName => {
                Self::ClanCreatePromptName(payload_of(parsed, payload)?)
            }
            InteractionKind::Connect4Accept => Self::Connect4Accept(payload_of(parsed, payload)?),
            InteractionKind::Connect4Decline => Self::Connect4Decline(payload_of(parsed, payload)?),
            InteractionKind::Connect4Move => Self::Connect4Move(payload_of(parsed, payload)?),
            InteractionKind::Connect4Forfeit => Self::Connect4Forfeit(payload_of(parsed, payload)?),
            InteractionKind::ShopBuyToolMenu => Self::ShopBuyToolMenu(payload_of(parsed, payload)?),
            InteractionKind::ShopSellToolMenu => {
                Self::ShopSellToolMenu(payload_of(parsed, payload)?)
            }
        })
    }
}

fn payload_of<T: DeserializeOwned>(kind: InteractionKind, payload: Option<&str>) -> Result<T> {
    let raw = payload.ok_or_else(|| Error::InvalidPayload {
        kind: kind.to_string(),
        reason: "missing payload".to_string(),
    })?;
    serde_json::from_str(raw).map_err(|e| Error::InvalidPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

/// Parameters for issuing a new token.
#[derive(Debug, Clone)]
pub struct NewInteraction<'a> {
    pub guild_id: &'a str,
    pub user_id: &'a str,
    pub channel_id: Option<&'a str>,
    pub action: PendingAction,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Persists a token and returns the stored row; its id is the custom id.
pub async fn issue<C>(
    db: &C,
    new: NewInteraction<'_>,
    now: DateTime<Utc>,
) -> Result<interaction::Model>
where
    C: ConnectionTrait,
{
    let row = interaction::ActiveModel {
        kind: Set(new.action.kind().as_str().to_string()),
        guild_id: Set(new.guild_id.to_string()),
        user_discord_id: Set(new.user_id.to_string()),
        channel_id: Set(new.channel_id.map(str::to_string)),
        payload: Set(new.action.encode_payload()?),
        consumed_at: Set(None),
        expires_at: Set(new.expires_at),
        created_at: Set(now),
        ..Default::default()
    };
    let created = row.insert(db).await?;

    tracing::debug!(
        interaction = created.id,
        kind = %created.kind,
        user = %created.user_discord_id,
        "Issued interaction"
    );
    Ok(created)
}

/// A stored token together with its decoded action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInteraction {
    pub record: interaction::Model,
    pub action: PendingAction,
}

/// Looks up the token behind a component custom id and decodes it.
pub async fn resolve<C>(db: &C, custom_id: &str) -> Result<ResolvedInteraction>
where
    C: ConnectionTrait,
{
    let not_found = || Error::InteractionNotFound {
        id: custom_id.to_string(),
    };
    let id: i64 = custom_id.parse().map_err(|_| not_found())?;
    let record = Interaction::find_by_id(id).one(db).await?.ok_or_else(not_found)?;
    let action = PendingAction::decode(&record.kind, record.payload.as_deref())?;
    Ok(ResolvedInteraction { record, action })
}

impl ResolvedInteraction {
    /// Token id.
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.record.id
    }

    /// The token was issued for `user_id`.
    pub fn ensure_owner(&self, user_id: &str) -> Result<()> {
        if self.record.user_discord_id == user_id {
            Ok(())
        } else {
            Err(Error::NotYourInteraction)
        }
    }

    /// The token was issued in `guild_id`.
    pub fn ensure_guild(&self, guild_id: &str) -> Result<()> {
        if self.record.guild_id == guild_id {
            Ok(())
        } else {
            Err(Error::WrongGuild)
        }
    }

    /// The token is neither consumed nor expired.
    pub fn ensure_usable(&self, now: DateTime<Utc>) -> Result<()> {
        if self.record.consumed_at.is_some() {
            return Err(Error::InteractionConsumed { id: self.id() });
        }
        match self.record.expires_at {
            Some(expires_at) if now >= expires_at => {
                Err(Error::InteractionExpired { id: self.id() })
            }
            _ => Ok(()),
        }
    }

    /// Owner, guild and freshness checks together.
    pub fn ensure_usable_by(
        &self,
        user_id: &str,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_owner(user_id)?;
        self.ensure_guild(guild_id)?;
        self.ensure_usable(now)
    }
}

/// Marks one token consumed. Losing a race against another consumer is
/// [`Error::InteractionConsumed`].
pub async fn consume<C>(db: &C, id: i64, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Interaction::update_many()
        .col_expr(interaction::Column::ConsumedAt, Expr::value(now))
        .filter(interaction::Column::Id.eq(id))
        .filter(interaction::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::InteractionConsumed { id });
    }
    Ok(())
}

fn kind_tags(kinds: &[InteractionKind]) -> Vec<&'static str> {
    kinds.iter().map(|k| k.as_str()).collect()
}

/// Consumes every open token of `kinds` held by a user in a guild, except
/// `keep`. Returns how many were consumed.
pub async fn consume_kinds_for_user<C>(
    db: &C,
    user_id: &str,
    guild_id: &str,
    kinds: &[InteractionKind],
    keep: Option<i64>,
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let mut update = Interaction::update_many()
        .col_expr(interaction::Column::ConsumedAt, Expr::value(now))
        .filter(interaction::Column::UserDiscordId.eq(user_id))
        .filter(interaction::Column::GuildId.eq(guild_id))
        .filter(interaction::Column::Kind.is_in(kind_tags(kinds)))
        .filter(interaction::Column::ConsumedAt.is_null());
    if let Some(keep) = keep {
        update = update.filter(interaction::Column::Id.ne(keep));
    }
    Ok(update.exec(db).await?.rows_affected)
}

/// Consumes every open token of `kinds` whose payload encodes to the same
/// JSON as `action`'s, whoever holds it.
pub async fn consume_kinds_for_payload<C>(
    db: &C,
    kinds: &[InteractionKind],
    action: &PendingAction,
    now: DateTime<Utc>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let Some(payload) = action.encode_payload()? else {
        return Ok(0);
    };
    let result = Interaction::update_many()
        .col_expr(interaction::Column::ConsumedAt, Expr::value(now))
        .filter(interaction::Column::Kind.is_in(kind_tags(kinds)))
        .filter(interaction::Column::Payload.eq(payload))
        .filter(interaction::Column::ConsumedAt.is_null())
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
