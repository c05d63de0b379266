//! Connect-4 game entity - One match between a challenger and an opponent.
//!
//! The board is stored as a JSON snapshot. `game_state` mirrors the state held
//! inside that snapshot so ended games can be filtered without decoding it;
//! both are always written together.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Connect-4 game database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connect4_games")]
pub struct Model {
    /// Unique identifier for the game
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild ID the game is played in
    pub guild_id: String,
    /// Discord channel ID the board is posted in
    pub channel_id: String,
    /// Discord user ID of the player who issued the challenge
    pub challenger: String,
    /// Discord user ID of the challenged player
    pub opponent: String,
    /// Color assigned to the challenger: `"RED"` or `"YELLOW"`
    pub challenger_color: String,
    /// Serialized board snapshot
    #[sea_orm(column_type = "Text")]
    pub board: String,
    /// Mirror of the board's game state
    pub game_state: String,
    /// Amount each player staked
    pub wager_amount: i64,
    /// Seconds a player has to make their move
    pub move_time: i64,
    /// When the last move was made (or the game started)
    pub last_move_at: DateTimeUtc,
    /// When the game was created
    pub created_at: DateTimeUtc,
    /// When the game reached a terminal state
    pub ended_at: Option<DateTimeUtc>,
}

/// Games have no modelled relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
