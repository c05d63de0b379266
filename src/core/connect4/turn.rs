//! Who may act on a game, and as which color.

use super::board::{Color, GameState};
use crate::errors::{Error, Result};

/// The two players of a game and the colors they hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seats {
    pub challenger: String,
    pub opponent: String,
    pub challenger_color: Color,
}

impl Seats {
    /// Color played by `user_id`, if they are seated.
    #[must_use]
    pub fn color_of(&self, user_id: &str) -> Option<Color> {
        if user_id == self.challenger {
            Some(self.challenger_color)
        } else if user_id == self.opponent {
            Some(self.challenger_color.other())
        } else {
            None
        }
    }

    /// User holding `color`.
    #[must_use]
    pub fn player_of(&self, color: Color) -> &str {
        if color == self.challenger_color {
            &self.challenger
        } else {
            &self.opponent
        }
    }

    /// Color of a player; [`Error::NotAPlayer`] for anyone else.
    pub fn require_color(&self, user_id: &str) -> Result<Color> {
        self.color_of(user_id).ok_or(Error::NotAPlayer)
    }
}

/// What a column pick from `user_id` amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnCheck {
    /// The user holds the turn and plays as this color.
    Move(Color),
    /// Anyone else, players waiting for their turn included, only suggests.
    Suggest,
}

/// Gates a column pick on whose turn it is.
#[must_use]
pub fn check_turn(seats: &Seats, user_id: &str, state: GameState) -> TurnCheck {
    match (seats.color_of(user_id), state.turn_color()) {
        (Some(mine), Some(on_turn)) if mine == on_turn => TurnCheck::Move(mine),
        _ => TurnCheck::Suggest,
    }
}
