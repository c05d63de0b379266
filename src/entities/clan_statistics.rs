//! Clan statistics entity - Named counters tracked per clan.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Clan statistics database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clan_statistics")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Clan the counter belongs to
    pub clan_id: i64,
    /// Counter name (e.g., `"currency_earned"`)
    pub key: String,
    /// Counter value
    pub value: i64,
    /// When the counter last changed
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
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
