//! Outcome notifications.
//!
//! Notifications are fire-and-forget: [`dispatch`] spawns the delivery and
//! whatever happens to it is only logged. Game state is never touched.

mod proxy;
mod telegram;

pub use proxy::{ProxyNotifier, TELEGRAM_PROXY_PATH};
pub use telegram::TelegramNotifier;

use crate::config::AppConfig;
use crate::reward::RewardCode;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A finished game worth telling the bot about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameReport {
    /// The human won and was issued a code.
    HumanWon {
        /// Code handed to the winner.
        code: RewardCode,
    },
    /// The computer won.
    ComputerWon,
    /// Nobody won.
    Draw,
}

impl GameReport {
    /// Text sent to the chat.
    pub fn message(&self) -> String {
        match self {
            GameReport::HumanWon { code } => format!("Victory! Promo code issued: {}", code),
            GameReport::ComputerWon => "Defeat".to_string(),
            GameReport::Draw => "Draw!".to_string(),
        }
    }
}

/// Why a notification was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum NotifyError {
    /// No bot token or chat id available.
    #[display("Telegram credentials not configured")]
    NotConfigured,

    /// The request never got a response.
    #[display("Notification transport failed: {}", _0)]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[display("Notification rejected with status {}: {}", status, body)]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },
}

impl std::error::Error for NotifyError {}

impl From<reqwest::Error> for NotifyError {
    /// Drops the request URL first. Telegram URLs embed the bot token.
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Transport(err.without_url().to_string())
    }
}

/// Sends a text notification somewhere.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Attempts delivery of `text`.
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;

    /// Short name for logs.
    fn name(&self) -> &str;

    /// Delivers `text` and reports whether it was accepted.
    ///
    /// Failures are logged here and never retried.
    async fn send(&self, text: &str) -> bool {
        match self.deliver(text).await {
            Ok(()) => {
                info!(notifier = self.name(), "Notification delivered");
                true
            }
            Err(e) => {
                warn!(notifier = self.name(), error = %e, "Notification failed");
                false
            }
        }
    }
}

/// Notifier used when nothing is configured. Logs and reports failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait::async_trait]
impl Notifier for DisabledNotifier {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        debug!(text, "Notifications disabled, dropping message");
        Err(NotifyError::NotConfigured)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Picks how a client delivers notifications.
///
/// A game server URL wins, so the token stays on the server. Otherwise the
/// configured bot is used directly, and failing that nothing is sent.
#[instrument(skip(config))]
pub fn client_notifier(server_url: Option<&str>, config: &AppConfig) -> Arc<dyn Notifier> {
    match (server_url, config.telegram()) {
        (Some(url), _) => Arc::new(ProxyNotifier::new(url)),
        (None, Some(telegram)) => Arc::new(TelegramNotifier::new(telegram.clone())),
        (None, None) => Arc::new(DisabledNotifier),
    }
}

/// Spawns delivery of `report` and returns immediately.
///
/// The handle resolves to whether the notifier accepted the message. Callers
/// are free to drop it.
#[instrument(skip(notifier), fields(notifier = notifier.name()))]
pub fn dispatch(notifier: Arc<dyn Notifier>, report: GameReport) -> JoinHandle<bool> {
    debug!("Dispatching outcome notification");
    tokio::spawn(async move {
        let text = report.message();
        notifier.send(&text).await
    })
}
