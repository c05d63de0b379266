//! Text rendering of a game for the board message.

use super::{
    board::{Board, Color, HEIGHT, Slot, WIDTH},
    game::Game,
};

const EMPTY_SLOT: &str = ":black_circle:";
const COLUMN_LABELS: [&str; WIDTH] = [
    ":one:", ":two:", ":three:", ":four:", ":five:", ":six:", ":seven:",
];
const DRAW_COLOR: u32 = 0x95a5a6;

/// Everything the board message shows, independent of the chat client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    /// Players line followed by the status line.
    pub description: String,
    /// Emoji grid, top row first, with column labels underneath.
    pub grid: String,
    /// Embed accent color.
    pub color: u32,
    /// Prize for a decisive result with a wager.
    pub prize: Option<i64>,
    /// Whether the board still takes moves.
    pub open: bool,
}

fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

fn slot_emoji(slot: Slot) -> &'static str {
    slot.color().map_or(EMPTY_SLOT, Color::emoji)
}

/// Renders the slots as an emoji grid.
#[must_use]
pub fn render_grid(board: &Board) -> String {
    let mut out = String::new();
    for row in (0..HEIGHT).rev() {
        for column in 0..WIDTH {
            out.push_str(slot_emoji(board.slot(column, row)));
        }
        out.push('\n');
    }
    out.push_str(&COLUMN_LABELS.concat());
    out
}

fn status_line(game: &Game) -> String {
    let seats = &game.seats;
    let board = &game.board;
    let tag = |color: Color| format!("{} {}", mention(seats.player_of(color)), color.emoji());

    if let Some(loser) = board.forfeit_state {
        return format!("{} forfeited, {} wins!", tag(loser), tag(loser.other()));
    }
    if let Some(loser) = board.out_of_time {
        return format!("{} ran out of time, {} wins!", tag(loser), tag(loser.other()));
    }
    if let Some(winner) = board.game_state.winner() {
        return format!("Winner: {}", tag(winner));
    }
    match board.game_state.turn_color() {
        Some(color) => format!("Turn: {} <t:{}:R>", tag(color), game.deadline().timestamp()),
        None => "It's a draw!".to_string(),
    }
}

/// Builds the view for a game's current state.
#[must_use]
pub fn describe(game: &Game) -> GameView {
    let seats = &game.seats;
    let mut description = format!(
        "{} {} vs {} {}\n",
        mention(&seats.challenger),
        seats.challenger_color.emoji(),
        seats.challenger_color.other().emoji(),
        mention(&seats.opponent),
    );
    description.push('\n');
    description.push_str(&status_line(game));

    let state = game.board.game_state;
    let color = state
        .turn_color()
        .or_else(|| state.winner())
        .map_or(DRAW_COLOR, Color::embed_color);
    let prize = (state.winner().is_some() && game.model.wager_amount > 0).then(|| game.prize());

    GameView {
        description,
        grid: render_grid(&game.board),
        color,
        prize,
        open: !state.is_terminal(),
    }
}

/// Public echo of a column picked by someone not on turn.
#[must_use]
pub fn suggestion_message(user_id: &str, column: super::board::Column) -> String {
    format!("{} suggests **{column}**", mention(user_id))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::connect4::{Column, GameState, Seats, engine};
    use crate::entities::connect4_game;
    use chrono::{TimeZone, Utc};

    fn game_with(board: Board, wager: i64) -> Game {
        let started = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Game {
            model: connect4_game::Model {
                id: 1,
                guild_id: "g".to_string(),
                channel_id: "c".to_string(),
                challenger: "10".to_string(),
                opponent: "20".to_string(),
                challenger_color: "RED".to_string(),
                board: board.to_json().unwrap(),
                game_state: board.game_state.as_str().to_string(),
                wager_amount: wager,
                move_time: 300,
                last_move_at: started,
                created_at: started,
                ended_at: None,
            },
            board,
            seats: Seats {
                challenger: "10".to_string(),
                opponent: "20".to_string(),
                challenger_color: Color::Red,
            },
        }
    }

    #[test]
    fn test_grid_shape() {
        let board = engine::play(&Board::new(), Column::Two).unwrap();
        let grid = render_grid(&board);
        let lines: Vec<&str> = grid.lines().collect();
        assert_eq!(lines.len(), HEIGHT + 1);
        // Bottom row is rendered last, just above the labels
        assert!(lines[HEIGHT - 1].starts_with(":black_circle::red_circle:"));
        assert!(lines[0].chars().filter(|c| *c == ':').count() == WIDTH * 2);
        assert!(lines[HEIGHT].starts_with(":one:"));
    }

    #[test]
    fn test_turn_line_has_deadline() {
        let view = describe(&game_with(Board::new(), 0));
        let deadline = Utc.with_ymd_and_hms(2025, 1, 1, 12, 5, 0).unwrap().timestamp();
        assert_eq!(
            view.description,
            format!(
                "<@10> :red_circle: vs :yellow_circle: <@20>\n\n\
                 Turn: <@10> :red_circle: <t:{deadline}:R>"
            )
        );
        assert_eq!(view.color, 0xff0000);
        assert!(view.open);
        assert_eq!(view.prize, None);
    }

    #[test]
    fn test_forfeit_wording() {
        let board = engine::forfeit(&Board::new(), Color::Red).unwrap();
        let view = describe(&game_with(board, 500));
        assert!(view.description.contains(
            "<@10> :red_circle: forfeited, <@20> :yellow_circle: wins!"
        ));
        assert_eq!(view.color, 0xffff00);
        assert_eq!(view.prize, Some(1_000));
        assert!(!view.open);
    }

    #[test]
    fn test_timeout_and_draw_wording() {
        let board = engine::time_out(&Board::new()).unwrap();
        let view = describe(&game_with(board, 0));
        assert!(view.description.contains("<@10> :red_circle: ran out of time"));

        let mut drawn = Board::new();
        drawn.game_state = GameState::Draw;
        let view = describe(&game_with(drawn, 500));
        assert!(view.description.ends_with("It's a draw!"));
        assert_eq!(view.prize, None);
        assert_eq!(view.color, DRAW_COLOR);
    }

    #[test]
    fn test_suggestion() {
        assert_eq!(
            suggestion_message("42", Column::Five),
            "<@42> suggests **5**"
        );
    }
}
