//! Pure Connect-4 rules.
//!
//! Nothing here touches storage. A move is applied in two steps: [`make_move`]
//! drops the disc for whoever is on turn, then [`calculate_winner`] derives the
//! next state from the resulting slots. [`play`] chains the two.

use super::board::{Board, Color, Column, GameState, HEIGHT, Slot, WIDTH};
use crate::errors::{Error, Result};

/// Directions checked for four in a row: horizontal, vertical and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// Returns the row a disc dropped into `column` would land on.
pub fn check_column(board: &Board, column: Column) -> Result<usize> {
    if board.game_state.is_terminal() {
        return Err(Error::GameEnded);
    }
    let height = board.column_height(column);
    if height >= HEIGHT {
        return Err(Error::ColumnFull { column });
    }
    Ok(height)
}

/// Drops a disc for the color on turn. The game state is left untouched;
/// [`calculate_winner`] advances it.
pub fn make_move(board: &Board, column: Column) -> Result<Board> {
    let row = check_column(board, column)?;
    let color = board.game_state.turn_color().ok_or(Error::GameEnded)?;

    let mut next = board.clone();
    next.columns[column.index()][row] = Slot::from(color);
    Ok(next)
}

/// Derives the state after the color on turn has dropped a disc: that color
/// wins on four in a row, a full board is a draw, otherwise the turn passes.
#[must_use]
pub fn calculate_winner(board: &Board) -> Board {
    let Some(mover) = board.game_state.turn_color() else {
        return board.clone();
    };

    let mut next = board.clone();
    next.game_state = if has_four(board, mover) {
        GameState::win_for(mover)
    } else if board.is_full() {
        GameState::Draw
    } else {
        GameState::turn_of(mover.other())
    };
    next
}

/// Applies a full move for the color on turn.
pub fn play(board: &Board, column: Column) -> Result<Board> {
    make_move(board, column).map(|b| calculate_winner(&b))
}

/// Ends the game with `loser` forfeiting; the other color wins.
pub fn forfeit(board: &Board, loser: Color) -> Result<Board> {
    if board.game_state.is_terminal() {
        return Err(Error::GameEnded);
    }
    let mut next = board.clone();
    next.forfeit_state = Some(loser);
    next.game_state = GameState::win_for(loser.other());
    Ok(next)
}

/// Ends the game because the color on turn did not move in time.
pub fn time_out(board: &Board) -> Result<Board> {
    let loser = board.game_state.turn_color().ok_or(Error::GameEnded)?;
    let mut next = board.clone();
    next.out_of_time = Some(loser);
    next.game_state = GameState::win_for(loser.other());
    Ok(next)
}

fn has_four(board: &Board, color: Color) -> bool {
    let target = Slot::from(color);
    for col in 0..WIDTH {
        for row in 0..HEIGHT {
            if board.slot(col, row) != target {
                continue;
            }
            for (dc, dr) in DIRECTIONS {
                if run_length(board, target, col, row, dc, dr) >= 4 {
                    return true;
                }
            }
        }
    }
    false
}

fn run_length(board: &Board, target: Slot, col: usize, row: usize, dc: isize, dr: isize) -> usize {
    let mut length = 0;
    let (mut c, mut r) = (col as isize, row as isize);
    while (0..WIDTH as isize).contains(&c)
        && (0..HEIGHT as isize).contains(&r)
        && board.slot(c as usize, r as usize) == target
    {
        length += 1;
        c += dc;
        r += dr;
    }
    length
}
