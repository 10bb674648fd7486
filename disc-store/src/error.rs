//! # Store Error Types
//!
//! Error types for validation, classification, and persistent storage.

use crate::format::AudioFormat;
use thiserror::Error;

/// Errors that can occur while validating or storing audio.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required argument was empty or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Payload exceeds the hard size ceiling.
    #[error("audio payload too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    /// No known magic-byte signature matched the payload.
    #[error("unsupported or unrecognized audio format")]
    UnrecognizedFormat,

    /// The payload classified cleanly but the format is not allow-listed
    /// for playback.
    #[error("format '{0}' is not supported")]
    UnsupportedFormat(AudioFormat),

    /// A stored audio id does not exist in the metadata index.
    #[error("audio id not found: {0}")]
    NotFound(crate::model::AudioId),

    /// The on-disk metadata index could not be parsed.
    #[error("metadata index corrupt: {0}")]
    IndexCorrupt(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if the error is a rejection of caller input rather
    /// than a storage-side failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidInput(_)
                | StoreError::TooLarge { .. }
                | StoreError::UnrecognizedFormat
                | StoreError::UnsupportedFormat(_)
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
