//! Telegram delivery of the run report.
//!
//! Delivery is best-effort: missing credentials or network errors are
//! logged and swallowed, never retried, and never abort the run.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{error, info, warn};

/// Telegram Bot API base URL
const TELEGRAM_API: &str = "https://api.telegram.org";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Notification delivery errors
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram credentials not configured")]
    CredentialsMissing,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Telegram notifier built from bot token and chat id.
pub struct TelegramNotifier {
    client: Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    /// Create a notifier. Credentials may be absent; delivery then fails
    /// softly at send time.
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            bot_token,
            chat_id,
        }
    }

    /// Send a Markdown message to the configured chat. Returns whether the
    /// call completed; the response body is not validated.
    pub async fn send(&self, text: &str) -> bool {
        match self.try_send(text).await {
            Ok(()) => true,
            Err(e) => {
                error!("Telegram delivery failed: {}", e);
                false
            }
        }
    }

    async fn try_send(&self, text: &str) -> Result<(), NotifyError> {
        let (bot_token, chat_id) = match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat)) => (token, chat),
            _ => return Err(NotifyError::CredentialsMissing),
        };

        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API, bot_token);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            warn!("Telegram API returned {}", response.status());
        } else {
            info!("Telegram message delivered");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_credentials_returns_false() {
        let notifier = TelegramNotifier::new(None, None);
        assert!(!notifier.send("hello").await);
    }

    #[tokio::test]
    async fn test_send_with_partial_credentials_returns_false() {
        let notifier = TelegramNotifier::new(Some("token".to_string()), None);
        assert!(!notifier.send("hello").await);

        let notifier = TelegramNotifier::new(None, Some("42".to_string()));
        assert!(!notifier.send("hello").await);
    }
}
