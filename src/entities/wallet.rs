//! Wallet entity - Per-user, per-guild currency balance.
//!
//! Balances are only ever changed through relative `balance = balance + delta`
//! updates issued by the ledger, never written back from application memory.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID of the owner
    pub user_discord_id: String,
    /// Discord guild ID the wallet belongs to
    pub guild_id: String,
    /// Current balance in whole currency units
    pub balance: i64,
    /// When the wallet was created
    pub created_at: DateTimeUtc,
}

/// Wallets have no modelled relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
