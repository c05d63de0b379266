//! Work entity - One use of a cooldown-limited earning command.
//!
//! Rows are only ever inserted; the cooldown check counts rows newer than the
//! start of the cooldown window.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Work database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord user ID who worked
    pub user_discord_id: String,
    /// Discord guild ID
    pub guild_discord_id: String,
    /// Kind of work: `"FISH"` or `"DAILY"`
    pub kind: String,
    /// When the command was used
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
