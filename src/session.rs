//! Game sessions: a core [`Game`] plus the input lock, reward code and
//! scoreboard that surround it.

use crate::notify::GameReport;
use crate::reward::RewardCode;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tictactoe_core::{Difficulty, Game, GameError, Mark, Outcome, RandomSource, select_move};
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Running tally of finished games in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Games the human won.
    pub human: u32,
    /// Games the computer won.
    pub computer: u32,
    /// Drawn games.
    pub draws: u32,
}

impl Scoreboard {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Won(Mark::X) => self.human += 1,
            Outcome::Won(Mark::O) => self.computer += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }
    }
}

/// What happened on one applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Who moved.
    pub mark: Mark,
    /// Where.
    pub index: usize,
    /// Board outcome after the move.
    pub outcome: Outcome,
    /// Set when the computer's reply is now due. Hand it back to
    /// [`GameSession::computer_move`].
    pub reply_ticket: Option<u64>,
    /// Set when the move ended the game.
    pub report: Option<GameReport>,
}

/// Errors from session-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum SessionError {
    /// Human input arrived while the computer reply is pending.
    #[display("Computer is thinking, input is locked")]
    InputLocked,

    /// The reply ticket does not match the pending reply (reset in between,
    /// or already played).
    #[display("No computer reply pending for ticket {}", _0)]
    StaleReply(u64),

    /// Unknown session id.
    #[display("Game session {} not found", _0)]
    NotFound(SessionId),

    /// The core rejected the move.
    #[display("{}", _0)]
    Game(GameError),
}

impl std::error::Error for SessionError {}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        SessionError::Game(err)
    }
}

/// One player's game against the computer.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    game: Game,
    pending_reply: Option<u64>,
    next_ticket: u64,
    reward: Option<RewardCode>,
    scoreboard: Scoreboard,
}

impl GameSession {
    /// Creates a new session with an empty board.
    #[instrument]
    pub fn new(id: SessionId, difficulty: Difficulty) -> Self {
        info!(session_id = %id, "Creating new game session");
        Self {
            id,
            game: Game::new(difficulty),
            pending_reply: None,
            next_ticket: 0,
            reward: None,
            scoreboard: Scoreboard::default(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// True while the computer's reply is pending.
    pub fn is_input_locked(&self) -> bool {
        self.pending_reply.is_some()
    }

    /// Ticket of the pending computer reply.
    pub fn pending_reply(&self) -> Option<u64> {
        self.pending_reply
    }

    /// Code issued for the current game, if the human won it.
    pub fn reward_code(&self) -> Option<&RewardCode> {
        self.reward.as_ref()
    }

    /// Results of finished games since the session started.
    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    /// Applies the human's move.
    ///
    /// If the game goes on, input locks and the returned report carries the
    /// ticket for the computer's reply. `rng` is only used to draw a reward
    /// code when this move wins.
    #[instrument(skip(self, rng), fields(session_id = %self.id))]
    pub fn human_move(
        &mut self,
        index: usize,
        rng: &mut impl RandomSource,
    ) -> Result<TurnReport, SessionError> {
        if self.is_input_locked() {
            warn!(index, "Human input while computer is thinking");
            return Err(SessionError::InputLocked);
        }

        let outcome = self.game.make_move(Mark::HUMAN, index)?;
        let mut turn = TurnReport {
            mark: Mark::HUMAN,
            index,
            outcome,
            reply_ticket: None,
            report: None,
        };

        if outcome.is_terminal() {
            turn.report = self.finish(outcome, rng);
        } else {
            let ticket = self.next_ticket;
            self.next_ticket += 1;
            self.pending_reply = Some(ticket);
            turn.reply_ticket = Some(ticket);
            debug!(ticket, "Computer reply scheduled");
        }

        Ok(turn)
    }

    /// Plays the computer's reply for `ticket` and unlocks input.
    #[instrument(skip(self, rng), fields(session_id = %self.id))]
    pub fn computer_move(
        &mut self,
        ticket: u64,
        rng: &mut impl RandomSource,
    ) -> Result<TurnReport, SessionError> {
        if self.pending_reply != Some(ticket) {
            debug!(pending = ?self.pending_reply, "Stale computer reply ignored");
            return Err(SessionError::StaleReply(ticket));
        }
        self.pending_reply = None;

        let index = select_move(self.game.board(), self.game.difficulty(), rng)?;
        let outcome = self.game.make_move(Mark::COMPUTER, index)?;
        info!(index, outcome = %outcome, "Computer moved");

        let report = if outcome.is_terminal() {
            self.finish(outcome, rng)
        } else {
            None
        };

        Ok(TurnReport {
            mark: Mark::COMPUTER,
            index,
            outcome,
            reply_ticket: None,
            report,
        })
    }

    /// Starts a fresh game, optionally at a new difficulty.
    ///
    /// Any pending reply is cancelled. The scoreboard is kept.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn reset(&mut self, difficulty: Option<Difficulty>) {
        self.game.reset();
        if let Some(difficulty) = difficulty {
            self.game.set_difficulty(difficulty);
        }
        self.pending_reply = None;
        self.reward = None;
        info!(difficulty = %self.game.difficulty(), "Session reset");
    }

    fn finish(&mut self, outcome: Outcome, rng: &mut impl RandomSource) -> Option<GameReport> {
        self.scoreboard.record(outcome);
        let report = match outcome {
            Outcome::Won(Mark::X) => {
                let code = RewardCode::generate(rng);
                self.reward = Some(code.clone());
                GameReport::HumanWon { code }
            }
            Outcome::Won(Mark::O) => GameReport::ComputerWon,
            Outcome::Draw => GameReport::Draw,
            Outcome::InProgress => return None,
        };
        info!(outcome = %outcome, scoreboard = ?self.scoreboard, "Game finished");
        Some(report)
    }
}

/// Sessions kept before the least recently used one is evicted.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone)]
struct SessionEntry {
    session: GameSession,
    last_used: Instant,
}

impl SessionEntry {
    fn new(session: GameSession) -> Self {
        Self {
            session,
            last_used: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut GameSession {
        self.last_used = Instant::now();
        &mut self.session
    }
}

/// Manages all game sessions.
///
/// The store is bounded: creating a session past `max_sessions` evicts the
/// least recently used one, and [`SessionManager::evict_idle`] drops
/// sessions nobody has touched for a while.
#[derive(Debug, Clone)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
    max_sessions: usize,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self {
            sessions: Arc::default(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl SessionManager {
    /// Creates a new session manager.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session manager");
        Self::default()
    }

    /// Caps the number of live sessions. Zero is treated as one.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a session under a fresh random id and returns a snapshot.
    #[instrument(skip(self))]
    pub fn create_session(&self, difficulty: Difficulty) -> GameSession {
        let mut sessions = self.lock();

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!(session_id = %oldest, "Evicted least recently used session");
        }

        let id = loop {
            let candidate = format!("{:016x}", rand::random::<u64>());
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = GameSession::new(id.clone(), difficulty);
        sessions.insert(id, SessionEntry::new(session.clone()));
        session
    }

    /// Gets a snapshot of a session by id.
    #[instrument(skip(self))]
    pub fn get_session(&self, id: &str) -> Option<GameSession> {
        let session = self
            .lock()
            .get_mut(id)
            .map(|entry| entry.touch().clone());
        if session.is_none() {
            debug!(session_id = id, "Session not found");
        }
        session
    }

    /// Runs `f` against a session while holding the lock.
    ///
    /// `f` must not block; it runs with every other session locked out.
    #[instrument(skip(self, f))]
    pub fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut GameSession) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let mut sessions = self.lock();
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        f(entry.touch())
    }

    /// Removes a session, returning its last state.
    #[instrument(skip(self))]
    pub fn remove_session(&self, id: &str) -> Option<GameSession> {
        self.lock().remove(id).map(|entry| entry.session)
    }

    /// Drops every session unused for longer than `max_idle` as of `now`.
    ///
    /// Returns how many were removed. A pending reply for an evicted
    /// session finds nothing and is discarded.
    #[instrument(skip(self, now))]
    pub fn evict_idle(&self, max_idle: Duration, now: Instant) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_used) <= max_idle);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no sessions exist.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
