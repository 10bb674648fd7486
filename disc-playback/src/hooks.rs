//! # Playback Extension Point
//!
//! Host code can observe and influence playback without mutating shared
//! state: before a session starts, the hook returns an immutable decision
//! value; after a session ends it is notified with the stop reason.

use crate::session::StopReason;
use crate::transport::Anchor;
use bytes::Bytes;
use disc_store::{AudioId, AudioMetadata};

/// Context handed to [`PlaybackHooks::on_before_play`].
pub struct PlayContext<'a> {
    pub anchor: Anchor,
    pub audio_id: AudioId,
    pub metadata: &'a AudioMetadata,
    pub data: &'a Bytes,
}

/// Decision returned by [`PlaybackHooks::on_before_play`].
#[derive(Debug, Clone)]
pub enum PlayDecision {
    /// Play the stored bytes unchanged.
    Proceed,
    /// Play these bytes instead of the stored ones.
    ReplaceAudio(Bytes),
    /// Do not start a session.
    Cancel,
}

/// Synchronous observer/extension interface for playback lifecycle.
pub trait PlaybackHooks: Send + Sync {
    /// Called before a session is created. The default proceeds unchanged.
    fn on_before_play(&self, _ctx: &PlayContext<'_>) -> PlayDecision {
        PlayDecision::Proceed
    }

    /// Called after a session is torn down, with the elapsed playback time
    /// and the reason. Natural completion arrives as
    /// [`StopReason::Completed`] so hosts can apply end-of-disc behavior.
    fn on_stop(&self, _anchor: Anchor, _audio_id: AudioId, _elapsed_ms: u64, _reason: StopReason) {}
}
