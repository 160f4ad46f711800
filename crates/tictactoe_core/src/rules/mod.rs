//! Game rules for tic-tac-toe.
//!
//! Pure functions for evaluating a board. Rules are kept apart from board
//! storage so the move selector can probe hypothetical boards with them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{LINES, check_winner};

use crate::types::{Board, Outcome};
use tracing::instrument;

/// Evaluates a board.
///
/// Lines are checked in [`LINES`] order and the first completed one wins.
/// Otherwise a full board is a draw and anything else is in progress.
#[instrument(level = "trace")]
pub fn evaluate(board: &Board) -> Outcome {
    if let Some(winner) = check_winner(board) {
        Outcome::Won(winner)
    } else if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::InProgress
    }
}
