//! # Playback Session Manager
//!
//! Owns at most one playback session per anchor.
//!
//! ## Lifecycle
//!
//! `start()` replaces whatever is playing at the anchor, looks up the
//! record, consults the extension hooks, opens a transport channel, and
//! spawns a paced delivery task. `stop()` tears the session down
//! cooperatively; the cancellation token ends delivery within one frame
//! interval. A periodic completion monitor sweeps sessions whose source
//! finished or whose elapsed time reached the declared duration, reporting
//! natural completion distinctly from manual stops.
//!
//! The transport handle is injected at construction; `rebind()` swaps it
//! when the host reconnects, without touching live sessions.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::hooks::{PlayContext, PlayDecision, PlaybackHooks};
use crate::session::{PlaybackSession, SessionShared, StopReason};
use crate::source::{AudioFrameSource, FrameSpec, RAW_CHUNK_INTERVAL};
use crate::transport::{Anchor, AudioChannel, ChannelKind, SpatialTransport};
use disc_store::{AudioId, ContentStore};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Manages playback sessions keyed by anchor.
pub struct PlaybackSessionManager {
    store: Arc<ContentStore>,
    transport: RwLock<Arc<dyn SpatialTransport>>,
    hooks: Option<Arc<dyn PlaybackHooks>>,
    sessions: Mutex<HashMap<Anchor, PlaybackSession>>,
    config: PlaybackConfig,
    monitor_cancel: CancellationToken,
}

impl PlaybackSessionManager {
    /// Create a manager and start its completion monitor.
    ///
    /// The monitor holds only a weak reference, so dropping the last `Arc`
    /// ends it.
    pub fn new(
        store: Arc<ContentStore>,
        transport: Arc<dyn SpatialTransport>,
        hooks: Option<Arc<dyn PlaybackHooks>>,
        config: PlaybackConfig,
    ) -> Arc<Self> {
        let manager = Arc::new(Self {
            store,
            transport: RwLock::new(transport),
            hooks,
            sessions: Mutex::new(HashMap::new()),
            config,
            monitor_cancel: CancellationToken::new(),
        });

        tokio::spawn(Self::monitor_loop(
            Arc::downgrade(&manager),
            manager.monitor_cancel.clone(),
            manager.config.monitor_interval(),
        ));

        manager
    }

    /// Swap the transport handle after a host reconnect. Existing sessions
    /// keep their channels; new sessions use the new handle.
    pub fn rebind(&self, transport: Arc<dyn SpatialTransport>) {
        info!("rebinding spatial transport");
        *self.transport.write() = transport;
    }

    /// Start playing `audio_id` at `anchor`.
    ///
    /// Any session already occupying the anchor is stopped first. Returns
    /// `Ok(false)` when there is nothing to play (unknown id, or a hook
    /// cancelled); transport failures are reported as errors.
    #[instrument(skip(self), fields(%anchor, %audio_id))]
    pub async fn start(&self, anchor: Anchor, audio_id: AudioId) -> Result<bool> {
        if self.sessions.lock().contains_key(&anchor) {
            debug!(%anchor, "replacing active session");
            self.stop(anchor, StopReason::Replaced);
        }

        let record = match self.store.get(audio_id).await? {
            Some(record) => record,
            None => {
                warn!(%audio_id, "audio record not found");
                return Ok(false);
            }
        };

        let mut data = record.data.clone();
        if let Some(hooks) = &self.hooks {
            let ctx = PlayContext {
                anchor,
                audio_id,
                metadata: &record.metadata,
                data: &data,
            };
            match hooks.on_before_play(&ctx) {
                PlayDecision::Proceed => {}
                PlayDecision::ReplaceAudio(replacement) => {
                    debug!(%anchor, "hook replaced audio payload");
                    data = replacement;
                }
                PlayDecision::Cancel => {
                    info!(%anchor, "playback cancelled by hook");
                    return Ok(false);
                }
            }
        }

        let transport = Arc::clone(&*self.transport.read());
        let kind = ChannelKind::at_anchor(anchor, self.config.audio_range as f32);
        let channel = transport
            .open_channel(kind, &self.config.category)
            .map_err(|e| PlaybackError::TransportUnavailable(e.to_string()))?;

        let spec = FrameSpec {
            sample_rate: self.config.target_sample_rate,
            frame_ms: self.config.frame_ms,
        };
        let source = AudioFrameSource::new(data, spec);
        let shared = Arc::new(SessionShared::new());
        let cancel = CancellationToken::new();

        tokio::spawn(deliver_frames(
            source,
            Arc::clone(&channel),
            Arc::clone(&shared),
            cancel.clone(),
            spec,
        ));

        let session = PlaybackSession::new(
            anchor,
            audio_id,
            channel,
            shared,
            cancel,
            record.metadata.duration_ms,
        );

        if let Some(previous) = self.sessions.lock().insert(anchor, session) {
            previous.teardown();
        }

        info!(%anchor, %audio_id, "playback started");
        Ok(true)
    }

    /// Stop the session at `anchor`, if any. No-op otherwise.
    #[instrument(skip(self), fields(%anchor, ?reason))]
    pub fn stop(&self, anchor: Anchor, reason: StopReason) {
        let session = self.sessions.lock().remove(&anchor);
        if let Some(session) = session {
            let elapsed = session.elapsed_ms();
            session.teardown();
            info!(%anchor, elapsed_ms = elapsed, ?reason, "playback stopped");
            if let Some(hooks) = &self.hooks {
                hooks.on_stop(anchor, session.audio_id, elapsed, reason);
            }
        }
    }

    /// Whether a session is actively playing at `anchor`.
    pub fn is_playing(&self, anchor: Anchor) -> bool {
        self.sessions
            .lock()
            .get(&anchor)
            .is_some_and(PlaybackSession::is_playing)
    }

    /// The audio id playing at `anchor`, if any session exists there.
    pub fn current_audio(&self, anchor: Anchor) -> Option<AudioId> {
        self.sessions.lock().get(&anchor).map(|s| s.audio_id)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Stop every session.
    pub fn stop_all(&self, reason: StopReason) {
        let anchors: Vec<Anchor> = self.sessions.lock().keys().copied().collect();
        info!(count = anchors.len(), "stopping all playback");
        for anchor in anchors {
            self.stop(anchor, reason);
        }
    }

    /// Stop everything and end the completion monitor.
    pub fn shutdown(&self) {
        info!("shutting down playback session manager");
        self.monitor_cancel.cancel();
        self.stop_all(StopReason::Manual);
    }

    /// Tear down sessions that are no longer playing, whose source
    /// finished, or whose elapsed time reached the declared duration.
    fn sweep_completed(&self) {
        let ended: Vec<(Anchor, StopReason)> = {
            let sessions = self.sessions.lock();
            sessions
                .iter()
                .filter(|(_, s)| !s.is_playing() || s.is_finished() || s.is_complete())
                .map(|(anchor, s)| {
                    let reason = if s.is_finished() || s.is_complete() {
                        StopReason::Completed
                    } else {
                        StopReason::Manual
                    };
                    (*anchor, reason)
                })
                .collect()
        };

        for (anchor, reason) in ended {
            debug!(%anchor, ?reason, "completion monitor ending session");
            self.stop(anchor, reason);
        }
    }

    async fn monitor_loop(
        manager: Weak<PlaybackSessionManager>,
        cancel: CancellationToken,
        interval: std::time::Duration,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let Some(manager) = manager.upgrade() else {
                break;
            };
            manager.sweep_completed();
        }
        debug!("completion monitor stopped");
    }
}

/// Deliver frames at the real-time cadence until the source is exhausted or
/// the session is cancelled. The sleep is interruptible, so cancellation
/// latency is bounded by one frame interval.
async fn deliver_frames(
    mut source: AudioFrameSource,
    channel: Arc<dyn AudioChannel>,
    shared: Arc<SessionShared>,
    cancel: CancellationToken,
    spec: FrameSpec,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("frame source exhausted");
                shared.mark_finished();
                break;
            }
            Err(e) => {
                error!(error = %e, "frame source failed");
                shared.mark_finished();
                break;
            }
        };

        if let Err(e) = channel.send(&frame) {
            warn!(error = %e, "transport rejected frame, ending delivery");
            shared.mark_finished();
            break;
        }

        let pacing = if frame.is_raw() {
            RAW_CHUNK_INTERVAL
        } else {
            spec.frame_interval()
        };
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pacing) => {}
        }
    }
}
