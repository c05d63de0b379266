//! Interaction entity - A pending button, select menu or modal.
//!
//! The row id is used verbatim as the Discord custom id, so a component never
//! carries application data itself. `consumed_at` is set exactly once, by a
//! conditional update, when the interaction is used up.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Interaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "interactions")]
pub struct Model {
    /// Unique identifier, doubles as the component custom id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Interaction kind tag (e.g., `"CLAN_CREATE"`, `"CONNECT4_MOVE"`)
    pub kind: String,
    /// Discord guild ID the component was issued in
    pub guild_id: String,
    /// Discord user ID the component was issued for
    pub user_discord_id: String,
    /// Discord channel ID, when the handler needs to reach the message later
    pub channel_id: Option<String>,
    /// JSON payload; shape depends on `kind`
    #[sea_orm(column_type = "Text", nullable)]
    pub payload: Option<String>,
    /// When the interaction was used up
    pub consumed_at: Option<DateTimeUtc>,
    /// When the interaction stops being accepted, if ever
    pub expires_at: Option<DateTimeUtc>,
    /// When the interaction was issued
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
