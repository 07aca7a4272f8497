//! Notification error types.

use std::time::Duration;

use thiserror::Error;

use apptrail_core::ConfigError;

pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors returned by notifier backends.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected: status {status}. Body: {body}")]
    Rejected { status: u16, body: String },

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid notifier configuration: {0}")]
    Config(#[from] ConfigError),
}
