//! # Spatial Audio Playback
//!
//! Real-time delivery of stored audio to a spatial audio transport.
//!
//! ## Overview
//!
//! This crate turns stored payloads into paced, fixed-size frames:
//! - [`AudioFrameSource`]: decode → downmix/resample → uniform frames, with
//!   a raw-chunk fallback when the container cannot be decoded
//! - [`SpatialTransport`]/[`AudioChannel`]: the injected sink abstraction,
//!   with channel kinds dispatched as a tagged union
//! - [`PlaybackSessionManager`]: one session per anchor with replace
//!   semantics, a periodic completion monitor, and cooperative teardown
//!
//! ## Architecture
//!
//! ```text
//! ContentStore ──get()──► PlaybackSessionManager ──open_channel()──► SpatialTransport
//!                                   │
//!                                   ▼
//!                          AudioFrameSource ──frames, one per interval──► AudioChannel
//! ```
//!
//! Frame delivery runs on one tokio task per session; pacing sleeps are
//! interruptible so `stop()` takes effect within one frame interval.

pub mod config;
pub mod decode;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod resample;
pub mod session;
pub mod source;
pub mod transport;

pub use config::PlaybackConfig;
pub use error::{PlaybackError, Result};
pub use hooks::{PlayContext, PlayDecision, PlaybackHooks};
pub use manager::PlaybackSessionManager;
pub use session::StopReason;
pub use source::{AudioFrameSource, FrameSpec};
pub use transport::{Anchor, AudioChannel, ChannelKind, Frame, SpatialTransport};
