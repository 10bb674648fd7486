//! # Playback Session
//!
//! State owned by one anchor's active playback: the transport channel, the
//! delivery task's cancellation token, and the shared flags the completion
//! monitor reads. A session is created by `start()`, torn down exactly once
//! by stop/replace/completion, and never reused afterwards.

use crate::transport::{Anchor, AudioChannel};
use disc_store::AudioId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The audio played to its end.
    Completed,
    /// A new session replaced this one at the same anchor.
    Replaced,
    /// Explicit stop request.
    Manual,
    /// The bound object was removed from the anchor.
    SourceRemoved,
    /// The anchor itself was destroyed.
    AnchorDestroyed,
}

impl StopReason {
    /// Natural completion, as opposed to an external interruption.
    pub fn is_natural(&self) -> bool {
        matches!(self, StopReason::Completed)
    }
}

/// Flags shared between the delivery task and the session manager.
#[derive(Default)]
pub struct SessionShared {
    playing: AtomicBool,
    finished: AtomicBool,
}

impl SessionShared {
    pub fn new() -> Self {
        Self {
            playing: AtomicBool::new(true),
            finished: AtomicBool::new(false),
        }
    }

    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn mark_stopped(&self) {
        self.playing.store(false, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire) && !self.is_finished()
    }
}

/// One anchor's active playback.
pub struct PlaybackSession {
    pub anchor: Anchor,
    pub audio_id: AudioId,
    channel: Arc<dyn AudioChannel>,
    shared: Arc<SessionShared>,
    cancel: CancellationToken,
    started_at: Instant,
    duration_ms: u64,
}

impl PlaybackSession {
    pub fn new(
        anchor: Anchor,
        audio_id: AudioId,
        channel: Arc<dyn AudioChannel>,
        shared: Arc<SessionShared>,
        cancel: CancellationToken,
        duration_ms: u64,
    ) -> Self {
        Self {
            anchor,
            audio_id,
            channel,
            shared,
            cancel,
            started_at: Instant::now(),
            duration_ms,
        }
    }

    /// Whether frames are still being delivered.
    pub fn is_playing(&self) -> bool {
        self.shared.is_playing()
    }

    /// Whether the frame source reported exhaustion.
    pub fn is_finished(&self) -> bool {
        self.shared.is_finished()
    }

    /// Elapsed wall-clock playback time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Whether elapsed time has reached the declared duration. Always false
    /// when the duration is unknown (zero).
    pub fn is_complete(&self) -> bool {
        self.duration_ms > 0 && self.elapsed_ms() >= self.duration_ms
    }

    /// Cancel delivery and close the transport channel. Idempotent.
    pub fn teardown(&self) {
        self.shared.mark_stopped();
        self.cancel.cancel();
        self.channel.close();
    }
}
