//! Error types for the game state machine and move selector.

use crate::types::{Mark, Outcome};

/// Why a move was rejected by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum InvalidMoveReason {
    /// Index outside 0-8.
    #[display("index out of range (must be 0-8)")]
    OutOfRange,
    /// Target cell already holds a mark.
    #[display("cell is already occupied")]
    Occupied,
}

/// Error that can occur when applying or choosing a move.
///
/// Every variant is a broken precondition on the caller's side, so these
/// are surfaced immediately rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GameError {
    /// Write to an occupied cell or an index outside the board.
    #[display("Invalid move at {}: {}", index, reason)]
    InvalidMove {
        /// Requested cell index.
        index: usize,
        /// What was wrong with it.
        reason: InvalidMoveReason,
    },

    /// Move selection requested on a full or finished board.
    #[display("No moves available")]
    NoMovesAvailable,

    /// Move attempted after the game ended.
    #[display("Game is already over: {}", _0)]
    GameOver(Outcome),

    /// Move attempted by the mark that is not on turn.
    #[display("It's not {}'s turn", _0)]
    WrongTurn(Mark),
}

impl std::error::Error for GameError {}
