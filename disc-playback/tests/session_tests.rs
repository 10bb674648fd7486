//! Integration tests for the session manager using a recording fake
//! transport: exclusivity, replace semantics, hook decisions, and the
//! completion monitor.

use bytes::Bytes;
use disc_playback::{
    Anchor, AudioChannel, ChannelKind, Frame, PlayContext, PlayDecision, PlaybackConfig,
    PlaybackError, PlaybackHooks, PlaybackSessionManager, SpatialTransport, StopReason,
};
use disc_store::{estimate, AudioFormat, AudioId, ContentStore, StoreConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Fakes
// ============================================================================

struct FakeChannel {
    frames: Mutex<Vec<Frame>>,
    closed: AtomicBool,
}

impl FakeChannel {
    fn new() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl AudioChannel for FakeChannel {
    fn send(&self, frame: &Frame) -> disc_playback::Result<()> {
        if self.is_closed() {
            return Err(PlaybackError::ChannelClosed);
        }
        self.frames.lock().push(frame.clone());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[derive(Default)]
struct FakeTransport {
    channels: Mutex<Vec<Arc<FakeChannel>>>,
}

impl FakeTransport {
    fn channel(&self, index: usize) -> Arc<FakeChannel> {
        Arc::clone(&self.channels.lock()[index])
    }

    fn opened(&self) -> usize {
        self.channels.lock().len()
    }
}

impl SpatialTransport for FakeTransport {
    fn open_channel(
        &self,
        _kind: ChannelKind,
        _category: &str,
    ) -> disc_playback::Result<Arc<dyn AudioChannel>> {
        let channel = Arc::new(FakeChannel::new());
        self.channels.lock().push(Arc::clone(&channel));
        Ok(channel)
    }
}

struct DownTransport;

impl SpatialTransport for DownTransport {
    fn open_channel(
        &self,
        _kind: ChannelKind,
        _category: &str,
    ) -> disc_playback::Result<Arc<dyn AudioChannel>> {
        Err(PlaybackError::TransportUnavailable("not connected".to_string()))
    }
}

#[derive(Default)]
struct RecordingHooks {
    cancel: bool,
    replacement: Option<Bytes>,
    stops: Mutex<Vec<(Anchor, AudioId, StopReason)>>,
}

impl PlaybackHooks for RecordingHooks {
    fn on_before_play(&self, _ctx: &PlayContext<'_>) -> PlayDecision {
        if self.cancel {
            PlayDecision::Cancel
        } else if let Some(replacement) = &self.replacement {
            PlayDecision::ReplaceAudio(replacement.clone())
        } else {
            PlayDecision::Proceed
        }
    }

    fn on_stop(&self, anchor: Anchor, audio_id: AudioId, _elapsed_ms: u64, reason: StopReason) {
        self.stops.lock().push((anchor, audio_id, reason));
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Bytes {
    let payload_len = samples.len() * 2;
    let byte_rate = sample_rate * 2;
    let mut data = Vec::with_capacity(44 + payload_len);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + payload_len as u32).to_le_bytes());
    data.extend_from_slice(b"WAVE");
    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&byte_rate.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes());
    data.extend_from_slice(&16u16.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&(payload_len as u32).to_le_bytes());
    for sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(data)
}

async fn store_wav(store: &ContentStore, samples: usize) -> AudioId {
    let payload = wav_bytes(48_000, &vec![1000i16; samples]);
    let metadata = estimate(&payload, AudioFormat::Wav);
    store.store(payload, metadata, "steve").await.unwrap()
}

async fn open_store(dir: &TempDir) -> Arc<ContentStore> {
    let config = StoreConfig {
        storage_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    Arc::new(ContentStore::open(&config).await.unwrap())
}

fn fast_config() -> PlaybackConfig {
    PlaybackConfig {
        monitor_interval_ms: 25,
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn start_unknown_id_creates_no_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let transport = Arc::new(FakeTransport::default());
    let manager =
        PlaybackSessionManager::new(store, transport.clone(), None, fast_config());

    let anchor = Anchor::new(0, 64, 0);
    let started = manager.start(anchor, AudioId::new()).await.unwrap();

    assert!(!started);
    assert_eq!(manager.active_count(), 0);
    assert_eq!(transport.opened(), 0);
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn start_delivers_frames_and_stop_closes_channel() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    // A long payload so delivery is still running when we stop.
    let id = store_wav(&store, 48_000 * 5).await;
    let transport = Arc::new(FakeTransport::default());
    let manager =
        PlaybackSessionManager::new(store, transport.clone(), None, fast_config());

    let anchor = Anchor::new(1, 64, 1);
    assert!(manager.start(anchor, id).await.unwrap());
    assert!(manager.is_playing(anchor));
    assert_eq!(manager.current_audio(anchor), Some(id));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let channel = transport.channel(0);
    assert!(channel.frame_count() > 0, "frames should be flowing");

    manager.stop(anchor, StopReason::Manual);
    assert!(!manager.is_playing(anchor));
    assert_eq!(manager.active_count(), 0);
    assert!(channel.is_closed());

    // Stopping again is a no-op.
    manager.stop(anchor, StopReason::Manual);
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn replace_leaves_exactly_one_session_playing_the_second_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let first = store_wav(&store, 48_000 * 5).await;
    let second = store_wav(&store, 48_000 * 5).await;
    let transport = Arc::new(FakeTransport::default());
    let hooks = Arc::new(RecordingHooks::default());
    let manager = PlaybackSessionManager::new(
        store,
        transport.clone(),
        Some(hooks.clone()),
        fast_config(),
    );

    let anchor = Anchor::new(2, 64, 2);
    assert!(manager.start(anchor, first).await.unwrap());
    assert!(manager.start(anchor, second).await.unwrap());

    assert_eq!(manager.active_count(), 1);
    assert_eq!(manager.current_audio(anchor), Some(second));
    assert!(transport.channel(0).is_closed(), "replaced channel must close");
    assert!(!transport.channel(1).is_closed());

    let stops = hooks.stops.lock().clone();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].1, first);
    assert_eq!(stops[0].2, StopReason::Replaced);
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn hook_cancel_prevents_session_creation() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let id = store_wav(&store, 4800).await;
    let transport = Arc::new(FakeTransport::default());
    let hooks = Arc::new(RecordingHooks {
        cancel: true,
        ..Default::default()
    });
    let manager =
        PlaybackSessionManager::new(store, transport.clone(), Some(hooks), fast_config());

    let started = manager.start(Anchor::new(3, 64, 3), id).await.unwrap();
    assert!(!started);
    assert_eq!(manager.active_count(), 0);
    assert_eq!(transport.opened(), 0, "no channel should be opened");
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn hook_replacement_audio_is_streamed() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let id = store_wav(&store, 4800).await;
    let transport = Arc::new(FakeTransport::default());
    // Replacement is opaque garbage, so delivery must arrive as raw chunks.
    let hooks = Arc::new(RecordingHooks {
        replacement: Some(Bytes::from(vec![0x77u8; 2000])),
        ..Default::default()
    });
    let manager =
        PlaybackSessionManager::new(store, transport.clone(), Some(hooks), fast_config());

    assert!(manager.start(Anchor::new(4, 64, 4), id).await.unwrap());
    tokio::time::sleep(Duration::from_millis(60)).await;

    let frames = transport.channel(0).frames.lock().clone();
    assert!(!frames.is_empty());
    assert!(frames.iter().all(Frame::is_raw));
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_fails_start_without_a_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let id = store_wav(&store, 4800).await;
    let manager =
        PlaybackSessionManager::new(store, Arc::new(DownTransport), None, fast_config());

    let result = manager.start(Anchor::new(5, 64, 5), id).await;
    assert!(matches!(result, Err(PlaybackError::TransportUnavailable(_))));
    assert_eq!(manager.active_count(), 0);
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn monitor_tears_down_finished_sessions_as_completed() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    // Two frames of audio: delivery finishes within ~40 ms.
    let id = store_wav(&store, 1920).await;
    let transport = Arc::new(FakeTransport::default());
    let hooks = Arc::new(RecordingHooks::default());
    let manager = PlaybackSessionManager::new(
        store,
        transport.clone(),
        Some(hooks.clone()),
        fast_config(),
    );

    let anchor = Anchor::new(6, 64, 6);
    assert!(manager.start(anchor, id).await.unwrap());

    let mut waited = Duration::ZERO;
    while manager.active_count() > 0 && waited < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(25)).await;
        waited += Duration::from_millis(25);
    }

    assert_eq!(manager.active_count(), 0, "monitor should sweep the session");
    let stops = hooks.stops.lock().clone();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].2, StopReason::Completed);
    assert!(transport.channel(0).is_closed());
    manager.shutdown();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_all_ends_every_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let a = store_wav(&store, 48_000 * 5).await;
    let b = store_wav(&store, 48_000 * 5).await;
    let transport = Arc::new(FakeTransport::default());
    let manager =
        PlaybackSessionManager::new(store, transport.clone(), None, fast_config());

    assert!(manager.start(Anchor::new(7, 64, 7), a).await.unwrap());
    assert!(manager.start(Anchor::new(8, 64, 8), b).await.unwrap());
    assert_eq!(manager.active_count(), 2);

    manager.stop_all(StopReason::AnchorDestroyed);
    assert_eq!(manager.active_count(), 0);
    assert!(transport.channel(0).is_closed());
    assert!(transport.channel(1).is_closed());
    manager.shutdown();
}
