//! Connect-4 minigame: pure rules in [`engine`], stored games in [`game`].

pub mod board;
pub mod engine;
pub mod game;
pub mod turn;
pub mod view;

pub use board::{Board, Color, Column, GameState, Slot};
pub use game::{Game, MoveOutcome};
pub use turn::{Seats, TurnCheck};
