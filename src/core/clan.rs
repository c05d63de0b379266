//! Clan lifecycle - the creation wizard, leaving and disbanding.
//!
//! The wizard is three steps, each behind a pending interaction: the Proceed
//! button opens the name form, the form submission pays for and founds the
//! clan. Every step retires the user's other open wizard tokens in the same
//! transaction as its own writes, so at most one wizard per user is live.

use crate::{
    core::{
        interaction::{
            self, CLAN_WIZARD_KINDS, NewInteraction, PendingAction, ResolvedInteraction,
            WizardMessagePayload,
        },
        wallet,
    },
    entities::{
        Clan, ClanBanishment, ClanInvitation, ClanMember, ClanStatistics, clan, clan_banishment,
        clan_invitation, clan_member, clan_statistics, interaction as interaction_entity,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    DatabaseConnection, PaginatorTrait, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use std::str::FromStr;
use tracing::instrument;

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 32;
const ABBREVIATION_CHARS: usize = 4;

/// Statistic key tracking currency earned by members through work.
pub const STAT_CURRENCY_EARNED: &str = "CURRENCY_EARNED";

/// Rank of a clan member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClanRole {
    Leader,
    Officer,
    Member,
}

impl ClanRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leader => "LEADER",
            Self::Officer => "OFFICER",
            Self::Member => "MEMBER",
        }
    }
}

impl FromStr for ClanRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LEADER" => Ok(Self::Leader),
            "OFFICER" => Ok(Self::Officer),
            "MEMBER" => Ok(Self::Member),
            other => Err(Error::Database(sea_orm::DbErr::Type(format!(
                "unknown clan role `{other}`"
            )))),
        }
    }
}

/// Who may join a clan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSetting {
    Open,
    InviteOnly,
    Closed,
}

impl JoinSetting {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InviteOnly => "INVITE_ONLY",
            Self::Closed => "CLOSED",
        }
    }
}

/// A validated clan name and the slug it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClanName {
    pub name: String,
    pub slug: String,
}

impl ClanName {
    /// Checks the shape of a name typed by a user. Uniqueness is checked by
    /// [`validate_clan_name`].
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        let length = name.chars().count();
        if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&length) {
            return Err(Error::InvalidClanName {
                reason: format!(
                    "Clan names must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters long."
                ),
            });
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        {
            return Err(Error::InvalidClanName {
                reason: "Clan names may only contain letters, numbers, spaces, `-` and `_`."
                    .to_string(),
            });
        }

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(Error::InvalidClanName {
                reason: "Clan names must contain at least one letter or number.".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            slug,
        })
    }
}

/// Lowercases a name and collapses every run of other characters into `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Parses a name and makes sure no clan in the guild already uses its slug.
pub async fn validate_clan_name<C>(db: &C, raw: &str, guild_id: &str) -> Result<ClanName>
where
    C: ConnectionTrait,
{
    let parsed = ClanName::parse(raw)?;
    let taken = Clan::find()
        .filter(clan::Column::DiscordGuildId.eq(guild_id))
        .filter(clan::Column::Slug.eq(parsed.slug.as_str()))
        .count(db)
        .await?;
    if taken > 0 {
        return Err(Error::InvalidClanName {
            reason: format!("A clan named **{}** already exists.", parsed.name),
        });
    }
    Ok(parsed)
}

/// Abbreviation offered for a new clan: its first four characters, if they
/// are plain letters and digits and shorter than the name.
#[must_use]
pub fn suggest_abbreviation(name: &str) -> Option<String> {
    let suggested: String = name.chars().take(ABBREVIATION_CHARS).collect();
    let suggested = suggested.trim();
    let plain = !suggested.is_empty() && suggested.chars().all(|c| c.is_ascii_alphanumeric());
    (plain && suggested.chars().count() < name.chars().count()).then(|| suggested.to_string())
}

/// A user's membership together with the clan it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserClan {
    pub clan: clan::Model,
    pub member: clan_member::Model,
}

/// The clan a user belongs to in a guild, if any.
pub async fn get_user_clan<C>(db: &C, user_id: &str, guild_id: &str) -> Result<Option<UserClan>>
where
    C: ConnectionTrait,
{
    let Some((member, found)) = ClanMember::find()
        .filter(clan_member::Column::DiscordUserId.eq(user_id))
        .filter(clan_member::Column::GuildId.eq(guild_id))
        .find_also_related(Clan)
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    let clan = found.ok_or(Error::ClanNotFound { id: member.clan_id })?;
    Ok(Some(UserClan { clan, member }))
}

/// Adds a membership row.
pub async fn add_member<C>(
    db: &C,
    clan: &clan::Model,
    user_id: &str,
    role: ClanRole,
    now: DateTime<Utc>,
) -> Result<clan_member::Model>
where
    C: ConnectionTrait,
{
    clan_member::ActiveModel {
        clan_id: Set(clan.id),
        guild_id: Set(clan.discord_guild_id.clone()),
        discord_user_id: Set(user_id.to_string()),
        role: Set(role.as_str().to_string()),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts an open, level 1 clan with `leader_id` as its only member.
pub async fn found_clan<C>(
    db: &C,
    guild_id: &str,
    leader_id: &str,
    name: &ClanName,
    now: DateTime<Utc>,
) -> Result<clan::Model>
where
    C: ConnectionTrait,
{
    let created = clan::ActiveModel {
        name: Set(name.name.clone()),
        slug: Set(name.slug.clone()),
        discord_guild_id: Set(guild_id.to_string()),
        settings_join: Set(JoinSetting::Open.as_str().to_string()),
        settings_abbreviation: Set(None),
        level: Set(1),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    add_member(db, &created, leader_id, ClanRole::Leader, now).await?;
    Ok(created)
}

/// Proceed and Cancel buttons of a fresh wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardTokens {
    pub proceed: interaction_entity::Model,
    pub cancel: interaction_entity::Model,
}

/// Step 1: retires any earlier wizard of the user and issues new buttons.
#[instrument(skip(db))]
pub async fn start_create_wizard(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<WizardTokens> {
    if get_user_clan(db, user_id, guild_id).await?.is_some() {
        return Err(Error::AlreadyInClan);
    }

    let token = |action| NewInteraction {
        guild_id,
        user_id,
        channel_id: None,
        action,
        expires_at: Some(now + Duration::seconds(ttl_secs)),
    };

    let txn = db.begin().await?;
    interaction::consume_kinds_for_user(&txn, user_id, guild_id, &CLAN_WIZARD_KINDS, None, now)
        .await?;
    let proceed = interaction::issue(&txn, token(PendingAction::ClanCreate), now).await?;
    let cancel = interaction::issue(&txn, token(PendingAction::ClanCreateWizardCancel), now).await?;
    txn.commit().await?;

    Ok(WizardTokens { proceed, cancel })
}

/// Step 2: the Proceed button issues the name form. The button itself stays
/// usable so a dismissed form can be reopened.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn open_name_prompt(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    user_id: &str,
    guild_id: &str,
    channel_id: &str,
    wizard_message_id: &str,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<interaction_entity::Model> {
    if resolved.action != PendingAction::ClanCreate {
        return Err(Error::WrongInteractionType {
            expected: "the Proceed button".to_string(),
        });
    }
    resolved.ensure_usable_by(user_id, guild_id, now)?;

    let txn = db.begin().await?;
    interaction::consume_kinds_for_user(
        &txn,
        user_id,
        guild_id,
        &CLAN_WIZARD_KINDS,
        Some(resolved.id()),
        now,
    )
    .await?;
    let prompt = interaction::issue(
        &txn,
        NewInteraction {
            guild_id,
            user_id,
            channel_id: Some(channel_id),
            action: PendingAction::ClanCreatePromptName(WizardMessagePayload {
                wizard_message_id: wizard_message_id.to_string(),
            }),
            expires_at: Some(now + Duration::seconds(ttl_secs)),
        },
        now,
    )
    .await?;
    txn.commit().await?;

    Ok(prompt)
}

/// The Cancel button retires the whole wizard.
pub async fn cancel_create_wizard(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    user_id: &str,
    guild_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    if resolved.action != PendingAction::ClanCreateWizardCancel {
        return Err(Error::WrongInteractionType {
            expected: "the Cancel button".to_string(),
        });
    }
    resolved.ensure_usable_by(user_id, guild_id, now)?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    interaction::consume_kinds_for_user(&txn, user_id, guild_id, &CLAN_WIZARD_KINDS, None, now)
        .await?;
    txn.commit().await?;
    Ok(())
}

/// A clan founded through the wizard, and where the wizard message lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedClan {
    pub clan: clan::Model,
    pub channel_id: Option<String>,
    pub wizard_message_id: String,
}

/// Step 3: the name form charges the price and founds the clan.
///
/// The charge, the clan, the leader membership and the retirement of every
/// wizard token land together or not at all.
#[instrument(skip(db, resolved), fields(interaction = resolved.id()))]
pub async fn complete_create_wizard(
    db: &DatabaseConnection,
    resolved: &ResolvedInteraction,
    user_id: &str,
    guild_id: &str,
    raw_name: &str,
    price: i64,
    now: DateTime<Utc>,
) -> Result<CreatedClan> {
    let PendingAction::ClanCreatePromptName(payload) = &resolved.action else {
        return Err(Error::WrongInteractionType {
            expected: "the clan name form".to_string(),
        });
    };
    resolved.ensure_usable_by(user_id, guild_id, now)?;

    if get_user_clan(db, user_id, guild_id).await?.is_some() {
        return Err(Error::AlreadyInClan);
    }
    let purse = wallet::create_wallet(db, user_id, guild_id).await?;
    if purse.balance < price {
        return Err(Error::InsufficientFunds {
            balance: purse.balance,
            required: price,
        });
    }
    let name = validate_clan_name(db, raw_name, guild_id).await?;

    let txn = db.begin().await?;
    interaction::consume(&txn, resolved.id(), now).await?;
    wallet::debit(&txn, purse.id, price).await?;
    let founded = found_clan(&txn, guild_id, user_id, &name, now).await?;
    interaction::consume_kinds_for_user(&txn, user_id, guild_id, &CLAN_WIZARD_KINDS, None, now)
        .await?;
    txn.commit().await?;

    if let Some(abbreviation) = suggest_abbreviation(&founded.name) {
        let used = Clan::find()
            .filter(clan::Column::DiscordGuildId.eq(guild_id))
            .filter(clan::Column::SettingsAbbreviation.eq(abbreviation.as_str()))
            .count(db)
            .await?;
        if used == 0 {
            Clan::update_many()
                .col_expr(clan::Column::SettingsAbbreviation, Expr::value(abbreviation))
                .filter(clan::Column::Id.eq(founded.id))
                .exec(db)
                .await?;
        }
    }

    let clan = Clan::find_by_id(founded.id)
        .one(db)
        .await?
        .ok_or(Error::ClanNotFound { id: founded.id })?;

    tracing::info!(
        clan = clan.id,
        name = %clan.name,
        leader = user_id,
        guild = guild_id,
        "Clan created"
    );

    Ok(CreatedClan {
        clan,
        channel_id: resolved.record.channel_id.clone(),
        wizard_message_id: payload.wizard_message_id.clone(),
    })
}

/// Deletes a clan and everything hanging off it, children first.
pub async fn disband_clan<C>(db: &C, clan_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    ClanInvitation::delete_many()
        .filter(clan_invitation::Column::ClanId.eq(clan_id))
        .exec(db)
        .await?;
    ClanBanishment::delete_many()
        .filter(clan_banishment::Column::ClanId.eq(clan_id))
        .exec(db)
        .await?;
    ClanMember::delete_many()
        .filter(clan_member::Column::ClanId.eq(clan_id))
        .exec(db)
        .await?;
    ClanStatistics::delete_many()
        .filter(clan_statistics::Column::ClanId.eq(clan_id))
        .exec(db)
        .await?;
    Clan::delete_by_id(clan_id).exec(db).await?;
    Ok(())
}

/// What `/clan leave` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The user was the last member; the clan is gone.
    Disbanded {
        clan_name: String,
        joined_at: DateTime<Utc>,
    },
    /// The user left; the clan carries on.
    Left {
        clan_name: String,
        joined_at: DateTime<Utc>,
    },
}

/// Removes a user from their clan, disbanding it when they are the last
/// member. Leaders cannot walk out on other members.
#[instrument(skip(db))]
pub async fn leave_clan(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
) -> Result<LeaveOutcome> {
    let txn = db.begin().await?;
    let UserClan { clan, member } = get_user_clan(&txn, user_id, guild_id)
        .await?
        .ok_or(Error::NotInClan)?;
    let members = ClanMember::find()
        .filter(clan_member::Column::ClanId.eq(clan.id))
        .count(&txn)
        .await?;
    let role: ClanRole = member.role.parse()?;

    if role == ClanRole::Leader && members > 1 {
        return Err(Error::LeaderCannotLeave);
    }

    let outcome = if members <= 1 {
        disband_clan(&txn, clan.id).await?;
        LeaveOutcome::Disbanded {
            clan_name: clan.name,
            joined_at: member.joined_at,
        }
    } else {
        ClanInvitation::delete_many()
            .filter(clan_invitation::Column::ClanId.eq(clan.id))
            .filter(clan_invitation::Column::UserDiscordId.eq(user_id))
            .exec(&txn)
            .await?;
        ClanMember::delete_by_id(member.id).exec(&txn).await?;
        LeaveOutcome::Left {
            clan_name: clan.name,
            joined_at: member.joined_at,
        }
    };
    txn.commit().await?;

    tracing::info!(user = user_id, guild = guild_id, ?outcome, "Clan left");
    Ok(outcome)
}

/// Clan overview for `/clan info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClanSummary {
    pub clan: clan::Model,
    pub member_count: u64,
    pub leader_id: Option<String>,
    pub currency_earned: i64,
}

/// Collects the overview of a clan.
pub async fn clan_summary<C>(db: &C, clan: clan::Model) -> Result<ClanSummary>
where
    C: ConnectionTrait,
{
    let member_count = ClanMember::find()
        .filter(clan_member::Column::ClanId.eq(clan.id))
        .count(db)
        .await?;
    let leader_id = ClanMember::find()
        .filter(clan_member::Column::ClanId.eq(clan.id))
        .filter(clan_member::Column::Role.eq(ClanRole::Leader.as_str()))
        .one(db)
        .await?
        .map(|m| m.discord_user_id);
    let currency_earned = ClanStatistics::find()
        .filter(clan_statistics::Column::ClanId.eq(clan.id))
        .filter(clan_statistics::Column::Key.eq(STAT_CURRENCY_EARNED))
        .one(db)
        .await?
        .map_or(0, |s| s.value);

    Ok(ClanSummary {
        clan,
        member_count,
        leader_id,
        currency_earned,
    })
}

/// Adds `delta` to a clan statistic, creating it on first use.
pub async fn add_to_statistic<C>(
    db: &C,
    clan_id: i64,
    key: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let updated = ClanStatistics::update_many()
        .col_expr(
            clan_statistics::Column::Value,
            Expr::col(clan_statistics::Column::Value).add(delta),
        )
        .col_expr(clan_statistics::Column::UpdatedAt, Expr::value(now))
        .filter(clan_statistics::Column::ClanId.eq(clan_id))
        .filter(clan_statistics::Column::Key.eq(key))
        .exec(db)
        .await?;

    if updated.rows_affected == 0 {
        clan_statistics::ActiveModel {
            clan_id: Set(clan_id),
            key: Set(key.to_string()),
            value: Set(delta),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const PRICE: i64 = 500_000;

    async fn resolve(
        db: &DatabaseConnection,
        token: &interaction_entity::Model,
    ) -> ResolvedInteraction {
        interaction::resolve(db, &token.id.to_string()).await.unwrap()
    }

    async fn name_prompt(db: &DatabaseConnection, user: &str) -> Result<ResolvedInteraction> {
        let now = Utc::now();
        let wizard = start_create_wizard(db, user, TEST_GUILD, 900, now).await?;
        let proceed = resolve(db, &wizard.proceed).await;
        let prompt =
            open_name_prompt(db, &proceed, user, TEST_GUILD, TEST_CHANNEL, "msg1", 900, now).await?;
        Ok(resolve(db, &prompt).await)
    }

    #[test]
    fn test_clan_name_rules() {
        let parsed = ClanName::parse("  The Night's Watch ").unwrap_err();
        assert!(matches!(parsed, Error::InvalidClanName { .. }));

        let parsed = ClanName::parse("  Wolf Pack_2 ").unwrap();
        assert_eq!(parsed.name, "Wolf Pack_2");
        assert_eq!(parsed.slug, "wolf-pack-2");

        assert!(ClanName::parse("ab").is_err());
        assert!(ClanName::parse(&"x".repeat(33)).is_err());
        assert!(ClanName::parse("---").is_err());
        assert!(ClanName::parse("abc").is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Red  Dragons"), "red-dragons");
        assert_eq!(slugify("-Edge-Case-"), "edge-case");
        assert_eq!(slugify("ÄÖÜ Clan"), "äöü-clan");
    }

    #[test]
    fn test_suggest_abbreviation() {
        assert_eq!(suggest_abbreviation("Wolf Pack").as_deref(), Some("Wolf"));
        assert_eq!(suggest_abbreviation("Abc Def").as_deref(), Some("Abc"));
        assert_eq!(suggest_abbreviation("Ab Cd"), None);
        // Not shorter than the name
        assert_eq!(suggest_abbreviation("Wolf"), None);
        // Not plain letters and digits
        assert_eq!(suggest_abbreviation("A-Team"), None);
    }

    #[tokio::test]
    async fn test_duplicate_slug_in_guild() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_clan(&db, "leader", "Wolf Pack").await?;

        assert!(matches!(
            validate_clan_name(&db, "wolf-pack", TEST_GUILD).await,
            Err(Error::InvalidClanName { .. })
        ));
        // Other guilds are unaffected
        assert!(validate_clan_name(&db, "Wolf Pack", "guild2").await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_wizard_started_twice_retires_first() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = start_create_wizard(&db, "founder", TEST_GUILD, 900, now).await?;
        let second = start_create_wizard(&db, "founder", TEST_GUILD, 900, now).await?;

        for token in [&first.proceed, &first.cancel] {
            assert!(matches!(
                resolve(&db, token).await.ensure_usable(now),
                Err(Error::InteractionConsumed { .. })
            ));
        }
        for token in [&second.proceed, &second.cancel] {
            resolve(&db, token).await.ensure_usable(now)?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_wizard_refused_for_members() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_clan(&db, "founder", "Wolf Pack").await?;
        assert!(matches!(
            start_create_wizard(&db, "founder", TEST_GUILD, 900, Utc::now()).await,
            Err(Error::AlreadyInClan)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_proceed_keeps_itself_and_retires_cancel() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let wizard = start_create_wizard(&db, "founder", TEST_GUILD, 900, now).await?;
        let proceed = resolve(&db, &wizard.proceed).await;

        let prompt =
            open_name_prompt(&db, &proceed, "founder", TEST_GUILD, TEST_CHANNEL, "msg1", 900, now)
                .await?;
        assert_eq!(prompt.channel_id.as_deref(), Some(TEST_CHANNEL));

        resolve(&db, &wizard.proceed).await.ensure_usable(now)?;
        assert!(resolve(&db, &wizard.cancel).await.ensure_usable(now).is_err());

        // Someone else clicking Proceed is turned away
        assert!(matches!(
            open_name_prompt(&db, &proceed, "intruder", TEST_GUILD, TEST_CHANNEL, "msg1", 900, now)
                .await,
            Err(Error::NotYourInteraction)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_wizard_founds_clan() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, "founder", TEST_GUILD, PRICE + 1_000).await?;
        let prompt = name_prompt(&db, "founder").await?;

        let created = complete_create_wizard(
            &db,
            &prompt,
            "founder",
            TEST_GUILD,
            "Wolf Pack",
            PRICE,
            Utc::now(),
        )
        .await?;
        assert_eq!(created.clan.name, "Wolf Pack");
        assert_eq!(created.clan.slug, "wolf-pack");
        assert_eq!(created.clan.level, 1);
        assert_eq!(created.clan.settings_join, "OPEN");
        assert_eq!(created.clan.settings_abbreviation.as_deref(), Some("Wolf"));
        assert_eq!(created.wizard_message_id, "msg1");
        assert_eq!(created.channel_id.as_deref(), Some(TEST_CHANNEL));

        let membership = get_user_clan(&db, "founder", TEST_GUILD).await?.unwrap();
        assert_eq!(membership.clan.id, created.clan.id);
        assert_eq!(membership.member.role, "LEADER");
        assert_eq!(
            wallet::find_wallet(&db, "founder", TEST_GUILD).await?.unwrap().balance,
            1_000
        );

        // Submitting the form again is already handled
        let reused = resolve(&db, &prompt.record).await;
        assert!(matches!(
            complete_create_wizard(
                &db,
                &reused,
                "founder",
                TEST_GUILD,
                "Other",
                PRICE,
                Utc::now()
            )
            .await,
            Err(Error::InteractionConsumed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_abbreviation_not_reused() -> Result<()> {
        let db = setup_test_db().await?;
        let existing = create_test_clan(&db, "other", "Wolf Riders").await?;
        Clan::update_many()
            .col_expr(clan::Column::SettingsAbbreviation, Expr::value("Wolf"))
            .filter(clan::Column::Id.eq(existing.id))
            .exec(&db)
            .await?;

        create_funded_wallet(&db, "founder", TEST_GUILD, PRICE).await?;
        let prompt = name_prompt(&db, "founder").await?;
        let created = complete_create_wizard(
            &db,
            &prompt,
            "founder",
            TEST_GUILD,
            "Wolf Pack",
            PRICE,
            Utc::now(),
        )
        .await?;
        assert_eq!(created.clan.settings_abbreviation, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_wizard_without_funds() -> Result<()> {
        let db = setup_test_db().await?;
        create_funded_wallet(&db, "founder", TEST_GUILD, PRICE - 1).await?;
        let prompt = name_prompt(&db, "founder").await?;

        let result = complete_create_wizard(
            &db,
            &prompt,
            "founder",
            TEST_GUILD,
            "Wolf Pack",
            PRICE,
            Utc::now(),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::InsufficientFunds {
                balance: 499_999,
                required: 500_000
            })
        ));
        assert!(get_user_clan(&db, "founder", TEST_GUILD).await?.is_none());
        // The form can be submitted again once the user has the money
        resolve(&db, &prompt.record).await.ensure_usable(Utc::now())?;
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_retires_wizard() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let wizard = start_create_wizard(&db, "founder", TEST_GUILD, 900, now).await?;
        let cancel = resolve(&db, &wizard.cancel).await;

        cancel_create_wizard(&db, &cancel, "founder", TEST_GUILD, now).await?;
        assert!(resolve(&db, &wizard.proceed).await.ensure_usable(now).is_err());
        assert!(matches!(
            cancel_create_wizard(&db, &cancel, "founder", TEST_GUILD, now).await,
            Err(Error::InteractionConsumed { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_sole_member_leaving_disbands() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let clan = create_test_clan(&db, "founder", "Wolf Pack").await?;
        clan_invitation::ActiveModel {
            clan_id: Set(clan.id),
            user_discord_id: Set("invitee".to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        clan_banishment::ActiveModel {
            clan_id: Set(clan.id),
            user_discord_id: Set("troll".to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        add_to_statistic(&db, clan.id, STAT_CURRENCY_EARNED, 1_234, now).await?;

        let outcome = leave_clan(&db, "founder", TEST_GUILD).await?;
        assert!(matches!(
            outcome,
            LeaveOutcome::Disbanded { ref clan_name, .. } if clan_name == "Wolf Pack"
        ));

        assert_eq!(Clan::find().count(&db).await?, 0);
        assert_eq!(ClanMember::find().count(&db).await?, 0);
        assert_eq!(ClanInvitation::find().count(&db).await?, 0);
        assert_eq!(ClanBanishment::find().count(&db).await?, 0);
        assert_eq!(ClanStatistics::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_leader_with_members_cannot_leave() -> Result<()> {
        let db = setup_test_db().await?;
        let clan = create_test_clan(&db, "founder", "Wolf Pack").await?;
        add_test_member(&db, &clan, "member").await?;

        assert!(matches!(
            leave_clan(&db, "founder", TEST_GUILD).await,
            Err(Error::LeaderCannotLeave)
        ));
        assert_eq!(ClanMember::find().count(&db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_member_leaves() -> Result<()> {
        let db = setup_test_db().await?;
        let clan = create_test_clan(&db, "founder", "Wolf Pack").await?;
        add_test_member(&db, &clan, "member").await?;
        for invitee in ["member", "someone"] {
            clan_invitation::ActiveModel {
                clan_id: Set(clan.id),
                user_discord_id: Set(invitee.to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let outcome = leave_clan(&db, "member", TEST_GUILD).await?;
        assert!(matches!(outcome, LeaveOutcome::Left { .. }));

        assert!(get_user_clan(&db, "member", TEST_GUILD).await?.is_none());
        assert!(get_user_clan(&db, "founder", TEST_GUILD).await?.is_some());
        let invitations = ClanInvitation::find().all(&db).await?;
        assert_eq!(invitations.len(), 1);
        assert_eq!(invitations[0].user_discord_id, "someone");
        Ok(())
    }

    #[tokio::test]
    async fn test_leave_without_clan() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            leave_clan(&db, "nobody", TEST_GUILD).await,
            Err(Error::NotInClan)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_and_statistics() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        let clan = create_test_clan(&db, "founder", "Wolf Pack").await?;
        add_test_member(&db, &clan, "member").await?;
        add_to_statistic(&db, clan.id, STAT_CURRENCY_EARNED, 500, now).await?;
        add_to_statistic(&db, clan.id, STAT_CURRENCY_EARNED, 250, now).await?;

        let summary = clan_summary(&db, clan).await?;
        assert_eq!(summary.member_count, 2);
        assert_eq!(summary.leader_id.as_deref(), Some("founder"));
        assert_eq!(summary.currency_earned, 750);
        Ok(())
    }
}
