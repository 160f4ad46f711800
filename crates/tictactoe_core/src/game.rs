//! Game state machine for tic-tac-toe.

use crate::error::GameError;
use crate::rules::evaluate;
use crate::types::{Board, Difficulty, Mark, Outcome};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// A single game: board, turn, outcome and the chosen difficulty.
///
/// The outcome only ever moves from `InProgress` to `Won` or `Draw`.
/// [`Game::reset`] is the one way back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    to_move: Mark,
    outcome: Outcome,
    difficulty: Difficulty,
    history: Vec<usize>,
}

impl Game {
    /// Creates a new game with the human (X) to move.
    #[instrument]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            board: Board::new(),
            to_move: Mark::HUMAN,
            outcome: Outcome::InProgress,
            difficulty,
            history: Vec::new(),
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the mark on turn.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Returns the current outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Returns the difficulty of the computer opponent.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Cell indices in the order they were played.
    pub fn history(&self) -> &[usize] {
        &self.history
    }

    /// Places `mark` at `index` and re-evaluates the board.
    ///
    /// # Errors
    ///
    /// - [`GameError::GameOver`] if the game already ended.
    /// - [`GameError::WrongTurn`] if `mark` is not on turn.
    /// - [`GameError::InvalidMove`] if the cell is out of range or occupied.
    #[instrument(skip(self), fields(board = %self.board))]
    pub fn make_move(&mut self, mark: Mark, index: usize) -> Result<Outcome, GameError> {
        if self.outcome.is_terminal() {
            warn!(outcome = %self.outcome, "Move attempted on finished game");
            return Err(GameError::GameOver(self.outcome));
        }
        if mark != self.to_move {
            warn!(expected = %self.to_move, "Move attempted out of turn");
            return Err(GameError::WrongTurn(mark));
        }

        self.board = self.board.apply_move(index, mark)?;
        self.history.push(index);
        self.outcome = evaluate(&self.board);
        if !self.outcome.is_terminal() {
            self.to_move = mark.opponent();
        }

        debug!(outcome = %self.outcome, board = %self.board, "Move applied");
        Ok(self.outcome)
    }

    /// Changes the difficulty. Takes effect on the next computer move.
    #[instrument(skip(self))]
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Clears the board and hands the first move back to the human.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        debug!(previous = %self.outcome, "Resetting game");
        self.board = Board::new();
        self.to_move = Mark::HUMAN;
        self.outcome = Outcome::InProgress;
        self.history.clear();
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Difficulty::default())
    }
}
