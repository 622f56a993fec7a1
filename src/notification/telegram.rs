//! Telegram notification implementation.
//!
//! Sends plain-text messages to a single chat via the Telegram Bot API
//! `sendMessage` endpoint, as a JSON body of shape `{chat_id, text}`.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;

use super::{Notifier, error::SendError};
use crate::config::{ConfigError, require_env};

/// Environment variable holding the Telegram bot credential.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable holding the destination chat id.
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Implementation of notifications via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    /// Full `sendMessage` endpoint URL, token included.
    endpoint: String,
    /// Destination chat id.
    chat_id: String,
    /// HTTP client for delivery. Must carry no retry middleware: one `send`
    /// is one outbound call.
    client: Arc<ClientWithMiddleware>,
}

impl TelegramNotifier {
    /// Creates a notifier from explicit credentials.
    ///
    /// # Arguments
    /// * `api_base` - Base URL of the Bot API (overridable for tests)
    /// * `token` - Bot credential
    /// * `chat_id` - Destination chat id
    /// * `client` - Non-retrying HTTP client for delivery
    pub fn new(
        api_base: &str,
        token: &str,
        chat_id: impl Into<String>,
        client: Arc<ClientWithMiddleware>,
    ) -> Self {
        Self {
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.into(),
            client,
        }
    }

    /// Creates a notifier from the process environment.
    ///
    /// A missing or empty `TELEGRAM_BOT_TOKEN` or `TELEGRAM_CHAT_ID` is a
    /// fatal configuration error: without notification credentials the
    /// service cannot fulfill its purpose, so startup must halt.
    pub fn from_env(
        api_base: &str,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, ConfigError> {
        let token = require_env(BOT_TOKEN_ENV)?;
        let chat_id = require_env(CHAT_ID_ENV)?;
        Ok(Self::new(api_base, &token, chat_id, client))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), SendError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        tracing::debug!(chat_id = %self.chat_id, "Sending Telegram message.");
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::RemoteRejected { status, body });
        }

        tracing::debug!(chat_id = %self.chat_id, "Telegram message delivered.");
        Ok(())
    }
}
