//! This module provides a retryable HTTP client with middleware for handling
//! transient errors, such as network issues or rate limiting.

use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{Jitter, RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{HttpRetryConfig, JitterSetting};

/// Creates the shared HTTP client with retry middleware.
///
/// # Parameters
/// - `retry`: Configuration for the retry policy
/// - `connect_timeout`: Connect timeout applied to the base client
///
/// # Returns
/// A `ClientWithMiddleware` that includes retry capabilities
pub fn build_http_client(
    retry: &HttpRetryConfig,
    connect_timeout: Duration,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let base_client = reqwest::Client::builder().connect_timeout(connect_timeout).build()?;

    // Determine the jitter setting and create the policy builder accordingly
    let policy_builder = match retry.jitter {
        JitterSetting::None => ExponentialBackoff::builder().jitter(Jitter::None),
        JitterSetting::Full => ExponentialBackoff::builder().jitter(Jitter::Full),
    };

    let retry_policy = policy_builder
        .base(retry.base_for_backoff)
        .retry_bounds(retry.initial_backoff_ms, retry.max_backoff_secs)
        .build_with_max_retries(retry.max_retries);

    Ok(ClientBuilder::new(base_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Creates the HTTP client used for notification delivery.
///
/// No retry middleware: delivery is at-most-once per send, so a single
/// `send` must map to a single outbound call even on 5xx or transport
/// failures.
pub fn build_notification_client(
    connect_timeout: Duration,
) -> Result<ClientWithMiddleware, reqwest::Error> {
    let base_client = reqwest::Client::builder().connect_timeout(connect_timeout).build()?;
    Ok(ClientBuilder::new(base_client).build())
}
