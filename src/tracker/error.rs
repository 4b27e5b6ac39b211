//! Issue tracker error types.

use thiserror::Error;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors talking to the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Transport failure, timeout, or a body that could not be decoded.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with a non-success status.
    #[error("tracker returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The tracker answered with a body that is not a work item.
    #[error("could not decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid tracker url: {0}")]
    InvalidUrl(String),
}

impl TrackerError {
    /// check if the tracker reported the item as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrackerError::Status { status: 404, .. })
    }

    /// check if this error is worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackerError::Http(e) => e.is_timeout() || e.is_connect(),
            TrackerError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
