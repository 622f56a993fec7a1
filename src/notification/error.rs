//! Error types for the notification service.

use thiserror::Error;

/// Defines the possible errors that can occur while sending a notification.
#[derive(Debug, Error)]
pub enum SendError {
    /// The outbound call failed at the network layer.
    #[error("Notification transport failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// The remote endpoint responded with a non-success status. The response
    /// body is surfaced for diagnostics; the failure is not retried here.
    #[error("Notification rejected by remote endpoint ({status}): {body}")]
    RemoteRejected {
        /// HTTP status returned by the endpoint.
        status: reqwest::StatusCode,
        /// Response body, when one could be read.
        body: String,
    },
}
