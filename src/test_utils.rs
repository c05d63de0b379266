//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating wallets, clans and games with sensible defaults.

use crate::{
    core::{
        clan::{self, ClanName, ClanRole},
        connect4::{
            Color, Game,
            game::{self, ChallengeRequest, ChallengeTokens},
        },
        interaction, wallet,
    },
    entities,
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Guild used by tests that do not care which guild they run in.
pub const TEST_GUILD: &str = "guild1";
/// Channel used for challenges and boards.
pub const TEST_CHANNEL: &str = "channel1";
/// User who issues test challenges.
pub const CHALLENGER: &str = "alice";
/// User who receives test challenges.
pub const OPPONENT: &str = "bob";
/// Starting balance of both test players.
pub const TEST_FUNDS: i64 = 10_000;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a wallet and credits it with `balance`.
pub async fn create_funded_wallet(
    db: &DatabaseConnection,
    user_id: &str,
    guild_id: &str,
    balance: i64,
) -> Result<entities::wallet::Model> {
    let created = wallet::create_wallet(db, user_id, guild_id).await?;
    wallet::credit(db, created.id, balance).await?;
    wallet::get_wallet_by_id(db, created.id).await
}

/// Sets up a database with one funded wallet.
/// Returns (db, wallet) for ledger tests.
pub async fn setup_with_wallet(
    balance: i64,
) -> Result<(DatabaseConnection, entities::wallet::Model)> {
    let db = setup_test_db().await?;
    let created = create_funded_wallet(&db, "test_user", TEST_GUILD, balance).await?;
    Ok((db, created))
}

/// Current balance of a user in the test guild, `0` without a wallet.
pub async fn balance_of(db: &DatabaseConnection, user_id: &str) -> Result<i64> {
    Ok(wallet::find_wallet(db, user_id, TEST_GUILD)
        .await?
        .map_or(0, |w| w.balance))
}

/// Funds both test players and issues a challenge from
/// [`CHALLENGER`] to [`OPPONENT`].
pub async fn issue_test_challenge(db: &DatabaseConnection, wager: i64) -> Result<ChallengeTokens> {
    for player in [CHALLENGER, OPPONENT] {
        create_funded_wallet(db, player, TEST_GUILD, TEST_FUNDS).await?;
    }
    let request = ChallengeRequest {
        guild_id: TEST_GUILD,
        channel_id: TEST_CHANNEL,
        challenger_id: CHALLENGER,
        opponent_id: OPPONENT,
        wager,
    };
    game::issue_challenge(db, request, TEST_FUNDS, 600, Utc::now()).await
}

/// Issues and accepts a challenge, giving the challenger `challenger_color`.
///
/// # Defaults
/// * move time: 300 seconds
pub async fn start_test_game(
    db: &DatabaseConnection,
    wager: i64,
    challenger_color: Color,
) -> Result<Game> {
    let tokens = issue_test_challenge(db, wager).await?;
    let accept = interaction::resolve(db, &tokens.accept.id.to_string()).await?;
    game::accept_challenge(
        db,
        &accept,
        OPPONENT,
        TEST_GUILD,
        TEST_CHANNEL,
        300,
        challenger_color,
        Utc::now(),
    )
    .await
}

/// Founds a clan in the test guild with `leader_id` as its leader, without
/// going through the wizard or charging anyone.
pub async fn create_test_clan(
    db: &DatabaseConnection,
    leader_id: &str,
    name: &str,
) -> Result<entities::clan::Model> {
    let name = ClanName::parse(name)?;
    clan::found_clan(db, TEST_GUILD, leader_id, &name, Utc::now()).await
}

/// Adds a plain member to a clan.
pub async fn add_test_member(
    db: &DatabaseConnection,
    clan: &entities::clan::Model,
    user_id: &str,
) -> Result<entities::clan_member::Model> {
    clan::add_member(db, clan, user_id, ClanRole::Member, Utc::now()).await
}
