//! # Ingest Error Types
//!
//! Error types for download and rate-limit operations.

use thiserror::Error;

/// Errors that can occur while acquiring remote audio.
#[derive(Error, Debug)]
pub enum IngestError {
    // ========================================================================
    // Input Validation
    // ========================================================================
    /// URL is syntactically invalid, has a disallowed scheme, or the host
    /// cannot be resolved.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// URL resolved to a loopback, private, or link-local address.
    #[error("access to local/private addresses is not allowed")]
    Blocked,

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Resource Limits
    // ========================================================================
    /// All download slots are occupied.
    #[error("server download limit reached, try again later")]
    Busy,

    /// The coordinator has been shut down.
    #[error("download coordinator is shut down")]
    Closed,

    /// Declared or observed payload size exceeds the configured maximum.
    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// Uploader must wait out the cooldown between consecutive uploads.
    #[error("please wait {remaining_secs}s before uploading again")]
    UploadCooldown { remaining_secs: u64 },

    /// Uploader exhausted the rolling upload window.
    #[error("upload limit reached: at most {max_per_window} uploads per minute")]
    UploadLimit { max_per_window: usize },

    // ========================================================================
    // Network
    // ========================================================================
    /// The request or body read exceeded the configured timeout.
    #[error("download timed out")]
    Timeout,

    /// Server answered with a non-success status.
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// Response does not look like an audio payload.
    #[error("invalid content type: {0}, expected an audio file")]
    InvalidContentType(String),

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// Download was cancelled cooperatively.
    #[error("download cancelled")]
    Cancelled,
}

impl IngestError {
    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IngestError::Busy
                | IngestError::Timeout
                | IngestError::Network(_)
                | IngestError::UploadCooldown { .. }
                | IngestError::UploadLimit { .. }
        )
    }

    /// Returns `true` if the failure was a security rejection.
    pub fn is_blocked(&self) -> bool {
        matches!(self, IngestError::Blocked)
    }

    /// Returns `true` if the failure was a rate-limit denial.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            IngestError::UploadCooldown { .. } | IngestError::UploadLimit { .. }
        )
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IngestError::Timeout
        } else {
            IngestError::Network(e.to_string())
        }
    }
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
