//! Board, slot, column and game state types.
//!
//! The board is persisted as JSON on the game row. Column 0 of `columns` is
//! the leftmost column and slot 0 of each column is the bottom slot.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of columns on the board.
pub const WIDTH: usize = 7;
/// Number of slots in each column.
pub const HEIGHT: usize = 6;

/// A player color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Color {
    Red,
    Yellow,
}

impl Color {
    /// The opposing color.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Red => Self::Yellow,
            Self::Yellow => Self::Red,
        }
    }

    /// Storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
        }
    }

    /// Discord emoji shortcode for the disc.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Red => ":red_circle:",
            Self::Yellow => ":yellow_circle:",
        }
    }

    /// Embed color used while this color is on turn or has won.
    #[must_use]
    pub const fn embed_color(self) -> u32 {
        match self {
            Self::Red => 0xff0000,
            Self::Yellow => 0xffff00,
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RED" => Ok(Self::Red),
            "YELLOW" => Ok(Self::Yellow),
            other => Err(Error::CorruptBoard {
                reason: format!("unknown color `{other}`"),
            }),
        }
    }
}

/// Contents of a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Slot {
    #[default]
    Empty,
    Red,
    Yellow,
}

impl From<Color> for Slot {
    fn from(color: Color) -> Self {
        match color {
            Color::Red => Self::Red,
            Color::Yellow => Self::Yellow,
        }
    }
}

impl Slot {
    /// The color occupying the slot, if any.
    #[must_use]
    pub const fn color(self) -> Option<Color> {
        match self {
            Self::Empty => None,
            Self::Red => Some(Color::Red),
            Self::Yellow => Some(Color::Yellow),
        }
    }
}

/// One of the seven droppable columns, labelled 1 to 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
}

impl Column {
    /// Every column, left to right.
    pub const ALL: [Self; WIDTH] = [
        Self::One,
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
    ];

    /// Zero-based index into [`Board::columns`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Select menu value and label.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::Seven => "7",
        }
    }

    /// Parses a select menu value.
    pub fn from_value(raw: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.value() == raw)
            .ok_or_else(|| Error::InvalidColumn {
                column: raw.to_string(),
            })
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// Whose turn it is, or how the game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    RedTurn,
    YellowTurn,
    RedWin,
    YellowWin,
    Draw,
}

impl GameState {
    /// Whether no further moves are accepted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::RedWin | Self::YellowWin | Self::Draw)
    }

    /// The color on turn, for non-terminal states.
    #[must_use]
    pub const fn turn_color(self) -> Option<Color> {
        match self {
            Self::RedTurn => Some(Color::Red),
            Self::YellowTurn => Some(Color::Yellow),
            Self::RedWin | Self::YellowWin | Self::Draw => None,
        }
    }

    /// The winning color, for decisive results.
    #[must_use]
    pub const fn winner(self) -> Option<Color> {
        match self {
            Self::RedWin => Some(Color::Red),
            Self::YellowWin => Some(Color::Yellow),
            Self::RedTurn | Self::YellowTurn | Self::Draw => None,
        }
    }

    /// The state where `color` is on turn.
    #[must_use]
    pub const fn turn_of(color: Color) -> Self {
        match color {
            Color::Red => Self::RedTurn,
            Color::Yellow => Self::YellowTurn,
        }
    }

    /// The state where `color` has won.
    #[must_use]
    pub const fn win_for(color: Color) -> Self {
        match color {
            Color::Red => Self::RedWin,
            Color::Yellow => Self::YellowWin,
        }
    }

    /// Storage tag, mirrored onto the game row.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RedTurn => "RED_TURN",
            Self::YellowTurn => "YELLOW_TURN",
            Self::RedWin => "RED_WIN",
            Self::YellowWin => "YELLOW_WIN",
            Self::Draw => "DRAW",
        }
    }
}

impl FromStr for GameState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RED_TURN" => Ok(Self::RedTurn),
            "YELLOW_TURN" => Ok(Self::YellowTurn),
            "RED_WIN" => Ok(Self::RedWin),
            "YELLOW_WIN" => Ok(Self::YellowWin),
            "DRAW" => Ok(Self::Draw),
            other => Err(Error::CorruptBoard {
                reason: format!("unknown game state `{other}`"),
            }),
        }
    }
}

/// A board snapshot together with its game state and terminal markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    /// Columns left to right, each listed bottom to top.
    pub columns: [[Slot; HEIGHT]; WIDTH],
    /// State derived from the slots (or from a forfeit/timeout marker).
    pub game_state: GameState,
    /// Set when the game ended because this color forfeited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forfeit_state: Option<Color>,
    /// Set when the game ended because this color ran out of time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_time: Option<Color>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board with Red to move.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: [[Slot::Empty; HEIGHT]; WIDTH],
            game_state: GameState::RedTurn,
            forfeit_state: None,
            out_of_time: None,
        }
    }

    /// Number of discs in a column.
    #[must_use]
    pub fn column_height(&self, column: Column) -> usize {
        self.columns[column.index()]
            .iter()
            .take_while(|slot| **slot != Slot::Empty)
            .count()
    }

    /// Number of discs of one color on the board.
    #[must_use]
    pub fn count(&self, color: Color) -> usize {
        self.columns
            .iter()
            .flatten()
            .filter(|slot| slot.color() == Some(color))
            .count()
    }

    /// Number of discs on the board.
    #[must_use]
    pub fn moves_played(&self) -> usize {
        self.count(Color::Red) + self.count(Color::Yellow)
    }

    /// Whether every slot is filled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.moves_played() == WIDTH * HEIGHT
    }

    /// Slot at `(column, row)`, row 0 being the bottom.
    #[must_use]
    pub const fn slot(&self, column: usize, row: usize) -> Slot {
        self.columns[column][row]
    }

    /// Serializes the board for storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parses a stored board and checks it is physically possible.
    pub fn from_json(raw: &str) -> Result<Self> {
        let board: Self = serde_json::from_str(raw).map_err(|e| Error::CorruptBoard {
            reason: e.to_string(),
        })?;
        board.validate()?;
        Ok(board)
    }

    /// Discs rest on each other and Red (who always starts) is never behind
    /// Yellow or more than one disc ahead.
    pub fn validate(&self) -> Result<()> {
        for (i, column) in self.columns.iter().enumerate() {
            let height = column.iter().take_while(|s| **s != Slot::Empty).count();
            if column[height..].iter().any(|s| *s != Slot::Empty) {
                return Err(Error::CorruptBoard {
                    reason: format!("floating disc in column {}", i + 1),
                });
            }
        }

        let red = self.count(Color::Red);
        let yellow = self.count(Color::Yellow);
        if red != yellow && red != yellow + 1 {
            return Err(Error::CorruptBoard {
                reason: format!("{red} red discs against {yellow} yellow"),
            });
        }

        let expected_turn = if red == yellow {
            GameState::RedTurn
        } else {
            GameState::YellowTurn
        };
        if !self.game_state.is_terminal() && self.game_state != expected_turn {
            return Err(Error::CorruptBoard {
                reason: format!(
                    "state {} does not match disc counts",
                    self.game_state.as_str()
                ),
            });
        }

        Ok(())
    }
}
