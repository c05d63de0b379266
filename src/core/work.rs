//! Work commands - `/fish` and `/daily`.
//!
//! Both are limited to a number of uses per rolling cooldown window, counted
//! from `work` rows. A use writes its `work` row and the wallet credit in one
//! transaction. Members of a clan earn a bonus of `level / divisor` on top of
//! non-negative rewards.

use crate::{
    config::settings::WorkLimit,
    core::{
        clan::{self, STAT_CURRENCY_EARNED},
        wallet,
    },
    entities::{Work, work},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sea_orm::{
    DatabaseConnection, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
};
use tracing::instrument;

/// Kind of work recorded in the `work` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkKind {
    Fish,
    Daily,
}

impl WorkKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fish => "FISH",
            Self::Daily => "DAILY",
        }
    }
}

/// What a fishing trip turned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FishScenario {
    Jormungandr,
    Kraken,
    Whale,
    LochNessMonster,
    Shark,
    BigFish,
    SmallFish,
    Shoe,
    Octopus,
    Turtle,
    Seaweed,
    HiddenTreasure,
    Jellyfish,
    Starfish,
    Nothing,
    PirateAttack,
}

/// Reward of a scenario, in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reward {
    Fixed(i64),
    Between(i64, i64),
    LoseBetween(i64, i64),
}

impl FishScenario {
    /// Every scenario, in the order their odds are stacked.
    pub const ALL: [Self; 16] = [
        Self::Jormungandr,
        Self::Kraken,
        Self::Whale,
        Self::LochNessMonster,
        Self::Shark,
        Self::BigFish,
        Self::SmallFish,
        Self::Shoe,
        Self::Octopus,
        Self::Turtle,
        Self::Seaweed,
        Self::HiddenTreasure,
        Self::Jellyfish,
        Self::Starfish,
        Self::Nothing,
        Self::PirateAttack,
    ];

    /// Relative weight of the scenario.
    #[must_use]
    pub const fn odds(self) -> u32 {
        match self {
            Self::Jormungandr => 1,
            Self::Kraken => 3,
            Self::LochNessMonster => 6,
            Self::Whale | Self::Octopus | Self::Turtle | Self::Seaweed => 50,
            Self::Shark => 170,
            Self::BigFish => 370,
            Self::SmallFish => 400,
            Self::Shoe | Self::HiddenTreasure | Self::Jellyfish | Self::Starfish => 100,
            Self::Nothing | Self::PirateAttack => 30,
        }
    }

    const fn reward(self) -> Reward {
        match self {
            Self::Jormungandr => Reward::Fixed(2_000_000),
            Self::Kraken => Reward::Fixed(1_200_000),
            Self::LochNessMonster => Reward::Fixed(300_000),
            Self::Whale => Reward::Fixed(50_000),
            Self::Shark => Reward::Fixed(15_000),
            Self::BigFish => Reward::Between(3_000, 4_000),
            Self::SmallFish | Self::Octopus | Self::Turtle => Reward::Between(800, 1_000),
            Self::Shoe => Reward::Between(0, 500),
            Self::Seaweed => Reward::Between(0, 30),
            Self::HiddenTreasure => Reward::Between(10_000, 15_000),
            Self::Jellyfish => Reward::Between(500, 1_000),
            Self::Starfish => Reward::Between(200, 600),
            Self::Nothing => Reward::Fixed(0),
            Self::PirateAttack => Reward::LoseBetween(5_000, 10_000),
        }
    }

    /// Line shown above the reward.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Jormungandr => {
                "The seas roared; the Kraken trembled. The World Serpent **Jörmungandr** graced you with His presence. :snake:"
            }
            Self::Kraken => "The Call of Cthulhu! You caught a kraken monster. 🦑",
            Self::Whale => "You caught a whale! 🐋",
            Self::LochNessMonster => "You caught the Loch Ness Monster! 🐉",
            Self::Shark => "You caught a shark! 🦈",
            Self::BigFish => "You caught a big fish! 🐟",
            Self::SmallFish => "You caught a small fish! 🐠",
            Self::Shoe => "You caught a shoe! 👞",
            Self::Octopus => "You caught an octopus! 🐙",
            Self::Turtle => "You caught a turtle! 🐢",
            Self::Seaweed => "You caught seaweed! 🌿",
            Self::HiddenTreasure => "You found a hidden treasure! 💰",
            Self::Jellyfish => "You caught a jellyfish! 🪼",
            Self::Starfish => "You caught a starfish! ⭐",
            Self::Nothing => "You caught nothing... 🎣",
            Self::PirateAttack => "You were attacked by pirates! 💣",
        }
    }

    /// Draws this scenario's reward.
    pub fn roll_reward<R: Rng + ?Sized>(self, rng: &mut R) -> i64 {
        match self.reward() {
            Reward::Fixed(amount) => amount,
            Reward::Between(low, high) => rng.random_range(low..=high),
            Reward::LoseBetween(low, high) => -rng.random_range(low..=high),
        }
    }
}

/// Sum of every scenario's odds.
#[must_use]
pub fn total_odds() -> u32 {
    FishScenario::ALL.iter().map(|s| s.odds()).sum()
}

/// Maps a roll in `0..total_odds()` onto the stacked odds table.
#[must_use]
pub fn scenario_for_roll(roll: u32) -> FishScenario {
    let mut ceiling = 0;
    for scenario in FishScenario::ALL {
        ceiling += scenario.odds();
        if roll < ceiling {
            return scenario;
        }
    }
    FishScenario::PirateAttack
}

/// Picks a scenario by its odds and draws its reward.
pub fn roll_fish<R: Rng + ?Sized>(rng: &mut R) -> (FishScenario, i64) {
    let scenario = scenario_for_roll(rng.random_range(0..total_odds()));
    (scenario, scenario.roll_reward(rng))
}

/// Clan bonus applied to a reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClanBonus {
    pub multiplier: f64,
    pub amount: i64,
}

impl ClanBonus {
    /// Bonus as a whole percentage (`0.25` → `25`).
    #[must_use]
    pub fn percent(&self) -> i64 {
        (self.multiplier * 100.0).round() as i64
    }
}

/// Bonus for a reward earned by a member of a clan at `clan_level`.
/// Losses never get a bonus.
#[must_use]
pub fn clan_bonus(reward: i64, clan_level: Option<i32>, divisor: i64) -> ClanBonus {
    let multiplier = match clan_level {
        Some(level) if reward >= 0 && divisor > 0 => f64::from(level) / divisor as f64,
        _ => 0.0,
    };
    ClanBonus {
        multiplier,
        amount: (reward as f64 * multiplier).round() as i64,
    }
}

/// Uses of a work kind inside the current window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkWindow {
    pub uses: u64,
    pub oldest: Option<DateTime<Utc>>,
}

/// Counts recent uses, failing with [`Error::OnCooldown`] when none are left.
pub async fn check_work_limit<C>(
    db: &C,
    user_id: &str,
    guild_id: &str,
    kind: WorkKind,
    limit: &WorkLimit,
    now: DateTime<Utc>,
) -> Result<WorkWindow>
where
    C: ConnectionTrait,
{
    let cooldown = Duration::seconds(limit.cooldown_secs);
    let recent = Work::find()
        .filter(work::Column::UserDiscordId.eq(user_id))
        .filter(work::Column::GuildDiscordId.eq(guild_id))
        .filter(work::Column::Kind.eq(kind.as_str()))
        .filter(work::Column::CreatedAt.gte(now - cooldown))
        .order_by_desc(work::Column::CreatedAt)
        .limit(limit.uses)
        .all(db)
        .await?;

    let oldest = recent.last().map(|w| w.created_at);
    let uses = recent.len() as u64;
    if uses >= limit.uses {
        let until = oldest.unwrap_or(now) + cooldown;
        return Err(Error::OnCooldown { until });
    }
    Ok(WorkWindow { uses, oldest })
}

/// Result of one use of a work command.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkOutcome {
    pub reward: i64,
    pub bonus: ClanBonus,
    pub total: i64,
    /// Uses left in the current window after this one.
    pub uses_left: u64,
    /// When the next use becomes available, if this was the last one.
    pub next_available: Option<DateTime<Utc>>,
}

/// Records one use and pays `reward` plus the clan bonus.
#[instrument(skip(db, limit))]
pub async fn perform_work(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    kind: WorkKind,
    limit: &WorkLimit,
    reward: i64,
    bonus_divisor: i64,
    now: DateTime<Utc>,
) -> Result<WorkOutcome> {
    let txn = db.begin().await?;
    let window = check_work_limit(&txn, user_id, guild_id, kind, limit, now).await?;
    let membership = clan::get_user_clan(&txn, user_id, guild_id).await?;
    let bonus = clan_bonus(reward, membership.as_ref().map(|m| m.clan.level), bonus_divisor);
    let total = reward + bonus.amount;

    work::ActiveModel {
        user_discord_id: Set(user_id.to_string()),
        guild_discord_id: Set(guild_id.to_string()),
        kind: Set(kind.as_str().to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let purse = wallet::create_wallet(&txn, user_id, guild_id).await?;
    wallet::credit(&txn, purse.id, total).await?;
    if let Some(membership) = &membership {
        if total > 0 {
            clan::add_to_statistic(&txn, membership.clan.id, STAT_CURRENCY_EARNED, total, now)
                .await?;
        }
    }
    txn.commit().await?;

    let uses_left = limit.uses.saturating_sub(window.uses + 1);
    let next_available = (uses_left == 0)
        .then(|| window.oldest.unwrap_or(now) + Duration::seconds(limit.cooldown_secs));

    tracing::info!(
        user = user_id,
        guild = guild_id,
        kind = kind.as_str(),
        total,
        "Work paid"
    );

    Ok(WorkOutcome {
        reward,
        bonus,
        total,
        uses_left,
        next_available,
    })
}

/// `/fish`: rolls a scenario and pays it out.
pub async fn go_fishing(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    limit: &WorkLimit,
    bonus_divisor: i64,
    now: DateTime<Utc>,
) -> Result<(FishScenario, WorkOutcome)> {
    let (scenario, reward) = roll_fish(&mut rand::rng());
    let outcome = perform_work(
        db,
        user_id,
        guild_id,
        WorkKind::Fish,
        limit,
        reward,
        bonus_divisor,
        now,
    )
    .await?;
    Ok((scenario, outcome))
}
