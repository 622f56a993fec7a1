//! This module defines the interface every monitor implements: a unit of work
//! that observes one external value and reports it for comparison.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Custom error type for a monitor's fetch-and-extract step.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The external source was unreachable, timed out, or failed at the
    /// transport level.
    #[error("Source unreachable: {0}")]
    Network(String),

    /// A required transport precondition (e.g. a minimum protocol version)
    /// was not met. Fatal for this run, not retried.
    #[error("Transport precondition not met: {0}")]
    ProtocolMismatch(String),

    /// The fetched content did not yield any candidate value.
    #[error("No candidate value extracted: {0}")]
    Extraction(String),

    /// The source responded with a non-success status.
    #[error("Source responded with non-success status {0}")]
    Upstream(reqwest::StatusCode),
}

/// A trait representing one registered monitor.
///
/// Monitors never touch baseline storage; they only produce the current
/// observed value and hand control back to the executor, which owns the
/// compare/update/notify sequence.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Stable, non-empty key used as the sole handle into baseline storage.
    fn identity(&self) -> &str;

    /// Human-readable name for logs and the heartbeat listing.
    fn display_name(&self) -> &str;

    /// Performs the external fetch and extraction, returning the current
    /// observed value. Must not mutate any shared state; the caller bounds
    /// its execution time.
    async fn fetch_current_value(&self) -> Result<String, FetchError>;
}
