//! Clan invitation entity - A pending invitation for a user to join a clan.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Clan invitation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clan_invitations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Clan issuing the invitation
    pub clan_id: i64,
    /// Discord user ID of the invitee
    pub user_discord_id: String,
    /// When the invitation was sent
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `ClanInvitation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invitation belongs to one clan
    #[sea_orm(
        belongs_to = "super::clan::Entity",
        from = "Column::ClanId",
        to = "super::clan::Column::Id"
    )]
    Clan,
}

impl Related<super::clan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
