//! # Playback Error Types

use disc_store::{AudioFormat, AudioId, StoreError};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The requested audio id does not exist in the store.
    #[error("audio record not found: {0}")]
    RecordNotFound(AudioId),

    /// The spatial transport refused to open a channel.
    #[error("spatial transport unavailable: {0}")]
    TransportUnavailable(String),

    /// The transport channel rejected a frame.
    #[error("audio channel closed")]
    ChannelClosed,

    /// Container requires an external transcoder pass before it can be
    /// decoded in this path.
    #[error("container '{0}' cannot be decoded directly; transcode it first")]
    UndecodableContainer(AudioFormat),

    /// Container probing failed: the bytes matched no decodable format.
    #[error("format probe failed: {0}")]
    Probe(String),

    /// Decoding produced no usable audio.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// Failure in the underlying content store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PlaybackError {
    /// Returns `true` if the frame source should degrade to raw-chunk
    /// fallback instead of treating this as fatal.
    pub fn is_degradable(&self) -> bool {
        matches!(self, PlaybackError::Probe(_) | PlaybackError::Decode(_))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
