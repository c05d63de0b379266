//! Clan entity - A guild-scoped group of players.
//!
//! A clan is identified inside its guild by a slug derived from its name.
//! Members, invitations, banishments and statistics all hang off the clan id
//! and are removed before the clan itself when it is disbanded.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Clan database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clans")]
pub struct Model {
    /// Unique identifier for the clan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name as entered by the founder
    pub name: String,
    /// Lowercase, dash-separated form of the name, unique per guild
    pub slug: String,
    /// Discord guild ID the clan lives in
    pub discord_guild_id: String,
    /// Join policy: `"OPEN"`, `"INVITE_ONLY"` or `"CLOSED"`
    pub settings_join: String,
    /// Optional short tag shown next to member names
    pub settings_abbreviation: Option<String>,
    /// Clan level; drives the work reward bonus
    pub level: i32,
    /// When the clan was founded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Clan and its child tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One clan has many members
    #[sea_orm(has_many = "super::clan_member::Entity")]
    Members,
    /// One clan has many outstanding invitations
    #[sea_orm(has_many = "super::clan_invitation::Entity")]
    Invitations,
    /// One clan has many banishments
    #[sea_orm(has_many = "super::clan_banishment::Entity")]
    Banishments,
    /// One clan has many statistics rows
    #[sea_orm(has_many = "super::clan_statistics::Entity")]
    Statistics,
}

impl Related<super::clan_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::clan_invitation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invitations.def()
    }
}

impl Related<super::clan_banishment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banishments.def()
    }
}

impl Related<super::clan_statistics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statistics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
