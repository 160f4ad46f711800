//! Prize Tic-Tac-Toe library
//!
//! Tic-tac-toe against a heuristic computer opponent. A human win earns a
//! promo code, and every finished game can be reported to a Telegram chat.
//!
//! # Architecture
//!
//! - **Core** (`tictactoe_core`): board, rules, state machine, move selector
//! - **Session**: input lock, pending computer reply, reward code, scoreboard
//! - **Notify**: fire-and-forget outcome messages (Telegram, proxy, disabled)
//! - **Server**: axum JSON game API plus the `/api/telegram` proxy route
//! - **TUI**: ratatui client playing a local session
//!
//! # Example
//!
//! ```
//! use prize_tictactoe::{GameSession, SessionError};
//! use tictactoe_core::{Difficulty, ScriptedRandom};
//!
//! let mut session = GameSession::new("demo".to_string(), Difficulty::Hard);
//! let mut rng = ScriptedRandom::default();
//!
//! let turn = session.human_move(0, &mut rng)?;
//! let ticket = turn.reply_ticket.expect("game continues");
//! let reply = session.computer_move(ticket, &mut rng)?;
//! assert_eq!(reply.index, 4); // hard takes the center first
//! # Ok::<(), SessionError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod notify;
mod reward;
mod server;
mod session;
mod tui;

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError, DEFAULT_TELEGRAM_API, TelegramConfig};

// Crate-level exports - Notifications
pub use notify::{
    DisabledNotifier, GameReport, Notifier, NotifyError, ProxyNotifier, TELEGRAM_PROXY_PATH,
    TelegramNotifier, client_notifier, dispatch,
};

// Crate-level exports - Reward codes
pub use reward::{REWARD_ALPHABET, REWARD_CODE_LEN, RewardCode};

// Crate-level exports - Server
pub use server::{
    AppState, GameStatus, GameView, MoveRequest, NewGameRequest, ResetRequest,
    TelegramProxyRequest, router, serve,
};

// Crate-level exports - Session management
pub use session::{
    DEFAULT_MAX_SESSIONS, GameSession, Scoreboard, SessionError, SessionId, SessionManager,
    TurnReport,
};

// Crate-level exports - Terminal client
pub use tui::{App, TUI_LOG_FILE, run_tui};
