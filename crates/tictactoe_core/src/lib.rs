//! Pure tic-tac-toe game logic.
//!
//! - **Types**: [`Board`], [`Mark`], [`Square`], [`Outcome`], [`Difficulty`]
//! - **Rules**: [`evaluate`] and the line table [`LINES`]
//! - **State machine**: [`Game`]
//! - **Move selection**: [`select_move`], driven by a [`RandomSource`]
//!
//! Nothing in this crate keeps global state. Every function takes its
//! inputs explicitly.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod game;
mod random;
mod types;

pub mod rules;
pub mod selector;

pub use error::{GameError, InvalidMoveReason};
pub use game::Game;
pub use random::{RandomSource, ScriptedRandom};
pub use rules::{LINES, check_winner, evaluate, is_draw, is_full};
pub use selector::{CENTER, CORNERS, select_move, select_move_for};
pub use types::{Board, BoardParseError, CELLS, Difficulty, Mark, Outcome, Square};

/// Applies `mark` at `index` to `board`, returning the new board.
///
/// Free-function form of [`Board::apply_move`].
///
/// # Errors
///
/// [`GameError::InvalidMove`] for an out-of-range index or occupied cell.
pub fn apply_move(board: &Board, index: usize, mark: Mark) -> Result<Board, GameError> {
    board.apply_move(index, mark)
}
