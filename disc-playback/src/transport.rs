//! # Spatial Transport Abstraction
//!
//! The playback core does not talk to the voice backend directly; it is
//! handed a [`SpatialTransport`] at construction and only needs "open a
//! channel", "push the next frame", and "close". Channel variants are a
//! tagged union dispatched by match, so each kind carries only the fields
//! it needs.

use crate::error::Result;
use bytes::Bytes;
use std::fmt;
use uuid::Uuid;

/// A stable spatial key playback sessions are anchored to, e.g. a jukebox
/// block position. At most one session exists per anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Anchor {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// World-space center of the anchored block.
    pub fn center(&self) -> [f64; 3] {
        [
            f64::from(self.x) + 0.5,
            f64::from(self.y) + 0.5,
            f64::from(self.z) + 0.5,
        ]
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// What kind of channel to open, and the fields that kind needs.
#[derive(Debug, Clone)]
pub enum ChannelKind {
    /// Audio emitted from a fixed world position, audible within `distance`.
    Locational { position: [f64; 3], distance: f32 },
    /// Audio delivered to a single listener.
    Personal { listener: Uuid },
}

impl ChannelKind {
    /// Locational channel centered on an anchor.
    pub fn at_anchor(anchor: Anchor, distance: f32) -> Self {
        ChannelKind::Locational {
            position: anchor.center(),
            distance,
        }
    }
}

/// One unit of delivery: PCM in normal operation, raw bytes in fallback
/// mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Signed 16-bit little-endian mono samples, always a full frame
    /// (zero-padded at end of stream).
    Pcm(Vec<i16>),
    /// Opaque bytes from an undecoded payload.
    Raw(Bytes),
}

impl Frame {
    pub fn is_raw(&self) -> bool {
        matches!(self, Frame::Raw(_))
    }
}

/// An open channel on the spatial transport.
///
/// Implementations must tolerate `close` being called more than once and
/// `send` being called concurrently with `close` (frames after close may be
/// dropped or rejected with [`crate::PlaybackError::ChannelClosed`]).
pub trait AudioChannel: Send + Sync {
    /// Push the next frame.
    fn send(&self, frame: &Frame) -> Result<()>;

    /// Tear the channel down.
    fn close(&self);

    /// Whether the channel has been closed.
    fn is_closed(&self) -> bool;
}

/// The spatial audio sink this core streams into.
pub trait SpatialTransport: Send + Sync {
    /// Open a channel of the given kind under a volume category tag.
    fn open_channel(
        &self,
        kind: ChannelKind,
        category: &str,
    ) -> Result<std::sync::Arc<dyn AudioChannel>>;
}
