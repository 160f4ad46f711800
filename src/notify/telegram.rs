//! Direct delivery through the Telegram Bot API.

use super::{Notifier, NotifyError};
use crate::config::TelegramConfig;
use serde::Serialize;
use tracing::{debug, error, instrument};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts messages with the bot's own token. Server side only.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    /// Creates a notifier for the given bot.
    #[instrument(skip(config), fields(chat_id = %config.chat_id()))]
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base().trim_end_matches('/'),
            self.config.bot_token()
        )
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, text), fields(chat_id = %self.config.chat_id()))]
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        debug!("Sending Telegram message");
        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessage {
                chat_id: self.config.chat_id(),
                text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Telegram API error");
            return Err(NotifyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_url() {
        let config = TelegramConfig::new("123:abc".to_string(), "42".to_string())
            .with_api_base("http://localhost:9000/");
        let notifier = TelegramNotifier::new(config);
        assert_eq!(
            notifier.send_message_url(),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_token() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = TelegramConfig::new("SECRET-BOT-TOKEN".to_string(), "42".to_string())
            .with_api_base(format!("http://{addr}"));
        let err = TelegramNotifier::new(config).deliver("hi").await.unwrap_err();

        assert!(matches!(err, NotifyError::Transport(_)));
        let rendered = format!("{err} {err:?}");
        assert!(!rendered.contains("SECRET-BOT-TOKEN"), "token leaked: {rendered}");
    }
}
