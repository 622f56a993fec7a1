//! # Notification Service
//!
//! This module is responsible for delivering plain-text messages to the
//! configured external channel. Delivery is at-most-once per call: exactly
//! one outbound call per send, no batching, no queue, no retry. Failures are
//! reported upward, never hidden.

pub mod error;
mod telegram;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use error::SendError;
pub use telegram::{BOT_TOKEN_ENV, CHAT_ID_ENV, TelegramNotifier};

/// A trait for sending a text message to a single external channel.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` with exactly one outbound call, reporting delivery
    /// success or failure.
    async fn send(&self, text: &str) -> Result<(), SendError>;
}
