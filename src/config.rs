//! Application configuration: defaults, TOML file, then environment.

use crate::session::DEFAULT_MAX_SESSIONS;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tictactoe_core::Difficulty;
use tracing::{debug, info, instrument, warn};

/// Telegram Bot API endpoint used when none is configured.
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Credentials for the Telegram bot that receives game outcomes.
#[derive(Clone, Getters, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather. Never leaves the server.
    bot_token: String,

    /// Chat the bot posts into.
    chat_id: String,

    /// Base URL of the Bot API.
    #[serde(default = "default_api_base")]
    api_base: String,
}

impl TelegramConfig {
    /// Creates Telegram credentials against the public Bot API.
    #[instrument(skip(bot_token))]
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            api_base: default_api_base(),
        }
    }

    /// Points the client at a different Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Top-level configuration for the server and the terminal client.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Interface the HTTP server binds to.
    host: String,

    /// Port the HTTP server binds to.
    port: u16,

    /// Pause before the computer replies, in milliseconds.
    thinking_delay_ms: u64,

    /// Difficulty for newly created games.
    difficulty: Difficulty,

    /// Live sessions the server keeps before evicting the least recently used.
    max_sessions: usize,

    /// Seconds a server session may sit unused before it is dropped.
    session_idle_secs: u64,

    /// Telegram credentials. Notifications are disabled without them.
    telegram: Option<TelegramConfig>,
}

fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            thinking_delay_ms: 500,
            difficulty: Difficulty::default(),
            max_sessions: DEFAULT_MAX_SESSIONS,
            session_idle_secs: 3600,
            telegram: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Reads the file if it exists, then layers the process environment on top.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Like [`AppConfig::load`], with environment variables read through `lookup`.
    pub fn load_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config = if path.as_ref().exists() {
            Self::from_file(path.as_ref())?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };
        config.with_env(lookup)
    }

    /// Applies `PORT`, `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID` and
    /// `TELEGRAM_API_BASE` as returned by `lookup`.
    ///
    /// Token and chat id may come from different sources. If only one of
    /// them ends up set, Telegram stays disabled.
    #[instrument(skip_all)]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::new(format!("Invalid PORT {:?}: {}", port, e)))?;
        }

        let existing = self.telegram.take();
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| existing.as_ref().map(|t| t.bot_token.clone()))
            .filter(|t| !t.is_empty());
        let chat_id = lookup("TELEGRAM_CHAT_ID")
            .or_else(|| existing.as_ref().map(|t| t.chat_id.clone()))
            .filter(|c| !c.is_empty());
        let api_base = lookup("TELEGRAM_API_BASE")
            .or_else(|| existing.as_ref().map(|t| t.api_base.clone()))
            .unwrap_or_else(default_api_base);

        self.telegram = match (token, chat_id) {
            (Some(token), Some(chat_id)) => {
                Some(TelegramConfig::new(token, chat_id).with_api_base(api_base))
            }
            (None, None) => None,
            _ => {
                warn!("Telegram bot token or chat id missing, notifications disabled");
                None
            }
        };

        Ok(self)
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the default difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Overrides the thinking delay.
    pub fn with_thinking_delay_ms(mut self, ms: u64) -> Self {
        self.thinking_delay_ms = ms;
        self
    }

    /// Replaces the Telegram credentials.
    pub fn with_telegram(mut self, telegram: Option<TelegramConfig>) -> Self {
        self.telegram = telegram;
        self
    }

    /// Overrides the session cap.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Overrides the idle timeout for server sessions.
    pub fn with_session_idle_secs(mut self, secs: u64) -> Self {
        self.session_idle_secs = secs;
        self
    }

    /// Pause before the computer replies.
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    /// How long a server session may sit unused.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
