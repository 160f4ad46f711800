//! Heuristic move selection for the computer opponent.
//!
//! This is a fixed priority list of board checks, not a search. Medium and
//! Hard take the center, block the opponent's immediate win, take their
//! own immediate win, and then fall back to a random cell (Medium) or a
//! random corner (Hard).

use crate::error::GameError;
use crate::random::RandomSource;
use crate::rules::evaluate;
use crate::types::{Board, Difficulty, Mark, Outcome};
use tracing::{debug, instrument, warn};

/// Center cell index.
pub const CENTER: usize = 4;

/// Corner cell indices.
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Chooses the computer's (O's) move.
///
/// # Errors
///
/// [`GameError::NoMovesAvailable`] if the board is already decided or full.
pub fn select_move(
    board: &Board,
    difficulty: Difficulty,
    rng: &mut impl RandomSource,
) -> Result<usize, GameError> {
    select_move_for(board, Mark::COMPUTER, difficulty, rng)
}

/// Chooses a move for `me` under the given difficulty.
///
/// # Errors
///
/// [`GameError::NoMovesAvailable`] if the board is already decided or full.
#[instrument(skip(board, rng), fields(board = %board))]
pub fn select_move_for(
    board: &Board,
    me: Mark,
    difficulty: Difficulty,
    rng: &mut impl RandomSource,
) -> Result<usize, GameError> {
    let empty = board.empty_cells();
    if empty.is_empty() || evaluate(board) != Outcome::InProgress {
        warn!("Move requested on a finished board");
        return Err(GameError::NoMovesAvailable);
    }

    let index = match difficulty {
        Difficulty::Easy => choose(&empty, rng),
        Difficulty::Medium | Difficulty::Hard => {
            if board.is_empty(CENTER) {
                debug!("Taking center");
                CENTER
            } else if let Some(block) = completing_move(board, &empty, me.opponent()) {
                debug!(index = block, "Blocking opponent");
                block
            } else if let Some(win) = completing_move(board, &empty, me) {
                debug!(index = win, "Taking win");
                win
            } else if difficulty == Difficulty::Hard {
                let corners: Vec<usize> = CORNERS
                    .iter()
                    .copied()
                    .filter(|&c| board.is_empty(c))
                    .collect();
                if corners.is_empty() {
                    choose(&empty, rng)
                } else {
                    choose(&corners, rng)
                }
            } else {
                choose(&empty, rng)
            }
        }
    };

    debug!(index, "Move selected");
    Ok(index)
}

/// First empty cell (ascending) where `mark` would complete a line.
fn completing_move(board: &Board, empty: &[usize], mark: Mark) -> Option<usize> {
    empty.iter().copied().find(|&index| {
        board
            .apply_move(index, mark)
            .is_ok_and(|probe| evaluate(&probe) == Outcome::Won(mark))
    })
}

/// Uniform pick from a non-empty slice.
fn choose(options: &[usize], rng: &mut impl RandomSource) -> usize {
    options[rng.pick(options.len())]
}
