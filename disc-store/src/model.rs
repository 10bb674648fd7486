//! # Domain Models
//!
//! Core record types shared across the ingest and playback pipeline.

use crate::error::{Result, StoreError};
use crate::format::AudioFormat;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a stored audio payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioId(pub Uuid);

impl AudioId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AudioId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AudioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing a stored audio payload.
///
/// Numeric fields are estimates for compressed formats; only WAV values are
/// read exactly from the container header (see [`crate::metadata`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    /// Classified container format.
    pub format: AudioFormat,
    /// Playback duration in milliseconds.
    pub duration_ms: u64,
    /// Average bitrate in kbps.
    pub bitrate_kbps: u32,
    /// Sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Best-effort title.
    pub title: String,
}

/// A stored audio payload with its metadata and upload provenance.
///
/// Records are immutable once created. The [`crate::store::ContentStore`]
/// owns them and hands out shared references; frame sources borrow the
/// `data` view without copying.
#[derive(Debug, Clone)]
pub struct AudioRecord {
    pub id: AudioId,
    pub data: Bytes,
    pub metadata: AudioMetadata,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl AudioRecord {
    /// Create a record, rejecting empty payloads and blank uploader names.
    pub fn new(
        id: AudioId,
        data: Bytes,
        metadata: AudioMetadata,
        uploaded_by: impl Into<String>,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Self> {
        let uploaded_by = uploaded_by.into();
        if data.is_empty() {
            return Err(StoreError::InvalidInput("audio data is empty"));
        }
        if uploaded_by.trim().is_empty() {
            return Err(StoreError::InvalidInput("uploader name is empty"));
        }
        Ok(Self {
            id,
            data,
            metadata,
            uploaded_by,
            uploaded_at,
        })
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> AudioMetadata {
        AudioMetadata {
            format: AudioFormat::Mp3,
            duration_ms: 1000,
            bitrate_kbps: 128,
            sample_rate_hz: 44100,
            title: "Custom Audio".to_string(),
        }
    }

    #[test]
    fn record_rejects_empty_data() {
        let result = AudioRecord::new(
            AudioId::new(),
            Bytes::new(),
            metadata(),
            "steve",
            Utc::now(),
        );
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn record_rejects_blank_uploader() {
        let result = AudioRecord::new(
            AudioId::new(),
            Bytes::from_static(b"abc"),
            metadata(),
            "  ",
            Utc::now(),
        );
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn audio_id_round_trips_through_string() {
        let id = AudioId::new();
        let parsed = AudioId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
