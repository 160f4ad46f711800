//! Delivery through the game server's `/api/telegram` route.
//!
//! Clients use this so the bot token stays on the server.

use super::{Notifier, NotifyError};
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Route on the game server that forwards to Telegram.
pub const TELEGRAM_PROXY_PATH: &str = "/api/telegram";

#[derive(Debug, Serialize)]
struct ProxyMessage<'a> {
    message: &'a str,
}

/// Forwards messages to a game server, which holds the credentials.
#[derive(Debug, Clone)]
pub struct ProxyNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyNotifier {
    /// Creates a notifier that posts to `server_url` + [`TELEGRAM_PROXY_PATH`].
    #[instrument]
    pub fn new(server_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{}", server_url.trim_end_matches('/'), TELEGRAM_PROXY_PATH),
        }
    }

    /// Full URL messages are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl Notifier for ProxyNotifier {
    #[instrument(skip(self, text), fields(endpoint = %self.endpoint))]
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        debug!("Forwarding message to game server");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ProxyMessage { message: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Proxy refused notification");
            return Err(NotifyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "proxy"
    }
}
