//! Application state and logic for the terminal client.

use super::input::{digit_cell, move_cursor};
use crate::notify::{self, GameReport, Notifier};
use crate::session::{GameSession, SessionError, TurnReport};
use crossterm::event::KeyCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tictactoe_core::{CENTER, Difficulty, Mark, Outcome, RandomSource};
use tracing::{debug, info, instrument};

/// Main application state.
pub struct App {
    session: GameSession,
    rng: Box<dyn RandomSource>,
    notifier: Arc<dyn Notifier>,
    thinking_delay: Duration,
    cursor: usize,
    reply_due: Option<(Instant, u64)>,
    status_message: String,
    should_quit: bool,
}

impl App {
    /// Creates a new application with a fresh game.
    pub fn new(
        difficulty: Difficulty,
        thinking_delay: Duration,
        notifier: Arc<dyn Notifier>,
        rng: impl RandomSource + 'static,
    ) -> Self {
        Self {
            session: GameSession::new("local".to_string(), difficulty),
            rng: Box::new(rng),
            notifier,
            thinking_delay,
            cursor: CENTER,
            reply_due: None,
            status_message: "Your move".to_string(),
            should_quit: false,
        }
    }

    /// The game session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Highlighted cell.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Gets the current status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// True once the user asked to leave.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Handles one key press.
    #[instrument(skip(self))]
    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("User quit");
                self.should_quit = true;
            }
            KeyCode::Char('r') => self.restart(None),
            KeyCode::Char('d') => {
                let next = self.session.game().difficulty().next();
                self.restart(Some(next));
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.play(self.cursor),
            KeyCode::Char(c) => {
                if let Some(index) = digit_cell(c) {
                    self.cursor = index;
                    self.play(index);
                }
            }
            other => self.cursor = move_cursor(self.cursor, other),
        }
    }

    /// Plays the computer's reply once its delay has passed.
    pub fn tick(&mut self, now: Instant) {
        let Some((due, ticket)) = self.reply_due else {
            return;
        };
        if now < due {
            return;
        }
        self.reply_due = None;

        let mut rng = &mut *self.rng;
        match self.session.computer_move(ticket, &mut rng) {
            Ok(turn) => self.after_turn(turn),
            Err(e) => {
                debug!(error = %e, "Computer reply dropped");
            }
        }
    }

    fn play(&mut self, index: usize) {
        let mut rng = &mut *self.rng;
        match self.session.human_move(index, &mut rng) {
            Ok(turn) => self.after_turn(turn),
            Err(SessionError::InputLocked) => {
                self.status_message = "Wait, the computer is thinking...".to_string();
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    fn after_turn(&mut self, turn: TurnReport) {
        if let Some(ticket) = turn.reply_ticket {
            self.reply_due = Some((Instant::now() + self.thinking_delay, ticket));
            self.status_message = "Computer is thinking...".to_string();
            return;
        }

        self.status_message = match turn.outcome {
            Outcome::Won(Mark::X) => match self.session.reward_code() {
                Some(code) => format!("You win! Your promo code: {}", code),
                None => "You win!".to_string(),
            },
            Outcome::Won(Mark::O) => "The computer wins. Press 'r' to try again.".to_string(),
            Outcome::Draw => "Draw! Press 'r' to play again.".to_string(),
            Outcome::InProgress => "Your move".to_string(),
        };

        if let Some(report) = turn.report {
            self.notify(report);
        }
    }

    fn notify(&self, report: GameReport) {
        notify::dispatch(self.notifier.clone(), report);
    }

    /// Restarts the game, optionally switching difficulty.
    pub fn restart(&mut self, difficulty: Option<Difficulty>) {
        debug!("Restarting game");
        self.session.reset(difficulty);
        self.reply_due = None;
        self.cursor = CENTER;
        self.status_message = format!(
            "New game ({}). Your move",
            self.session.game().difficulty()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{DisabledNotifier, NotifyError};
    use std::sync::Mutex;
    use tictactoe_core::ScriptedRandom;

    fn app() -> App {
        App::new(
            Difficulty::Hard,
            Duration::ZERO,
            Arc::new(DisabledNotifier),
            ScriptedRandom::default(),
        )
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl Notifier for Recorder {
        async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    #[test]
    fn test_move_locks_until_tick() {
        let mut app = app();
        app.handle_key(KeyCode::Char('1'));
        assert!(app.session().is_input_locked());
        assert_eq!(app.status_message(), "Computer is thinking...");

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.session().game().history(), &[0]);

        app.tick(Instant::now());
        assert!(!app.session().is_input_locked());
        assert_eq!(app.session().game().history(), &[0, CENTER]);
    }

    #[test]
    fn test_difficulty_key_cycles_and_restarts() {
        let mut app = app();
        app.handle_key(KeyCode::Char('5'));
        app.handle_key(KeyCode::Char('d'));
        assert_eq!(app.session().game().difficulty(), Difficulty::Easy);
        assert!(app.session().game().history().is_empty());
        assert!(!app.session().is_input_locked());
    }

    #[test]
    fn test_arrows_then_enter_plays_cursor() {
        let mut app = app();
        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.cursor(), 0);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.session().game().history(), &[0]);
    }

    #[tokio::test]
    async fn test_computer_win_is_reported() {
        let recorder = Arc::new(Recorder::default());
        let mut app = App::new(
            Difficulty::Hard,
            Duration::ZERO,
            recorder.clone(),
            ScriptedRandom::default(),
        );

        // Hard answers with the center, then corner 0, then wins on the diagonal.
        for key in ['2', '4', '8'] {
            app.handle_key(KeyCode::Char(key));
            app.tick(Instant::now());
        }
        assert_eq!(
            app.session().game().outcome(),
            Outcome::Won(Mark::COMPUTER)
        );
        assert!(app.status_message().starts_with("The computer wins"));

        for _ in 0..100 {
            if !recorder.0.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*recorder.0.lock().unwrap(), vec!["Defeat".to_string()]);
    }
}
