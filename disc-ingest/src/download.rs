//! # Download Coordinator
//!
//! Bounded-concurrency streaming downloads of remote audio.
//!
//! ## Behavior
//!
//! - URL validation (including the SSRF guard) runs before a slot is taken
//!   or any request is sent.
//! - A semaphore bounds simultaneous downloads; when all slots are busy the
//!   request fails fast instead of queueing.
//! - The response body is read as a stream. The accumulated size is checked
//!   against the configured maximum after every chunk, independent of the
//!   declared content length.
//! - Progress callbacks are coalesced: a report fires only when progress
//!   advanced by at least the configured step since the last report.
//! - Cancellation is cooperative; the flag is checked before and during
//!   every chunk read, and the slot is released on every exit path.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::validate::validate_url;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const USER_AGENT: &str = concat!("audio-disc-platform/", env!("CARGO_PKG_VERSION"));

/// Lifecycle of one download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Pending,
    Downloading,
    Cancelled,
    Complete,
    Failed,
}

struct TaskEntry {
    state: Mutex<DownloadState>,
    token: CancellationToken,
}

impl TaskEntry {
    fn new() -> Self {
        Self {
            state: Mutex::new(DownloadState::Pending),
            token: CancellationToken::new(),
        }
    }

    fn set_state(&self, state: DownloadState) {
        *self.state.lock() = state;
    }
}

/// Coordinates concurrent audio downloads.
pub struct DownloadCoordinator {
    client: reqwest::Client,
    config: IngestConfig,
    slots: Arc<Semaphore>,
    active: Mutex<HashMap<Uuid, Arc<TaskEntry>>>,
    closed: AtomicBool,
}

impl DownloadCoordinator {
    /// Create a coordinator with the given configuration.
    ///
    /// Fails only if the HTTP client cannot be constructed.
    pub fn new(config: IngestConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| IngestError::Network(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            slots: Arc::new(Semaphore::new(config.max_concurrent_downloads)),
            config,
            active: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        })
    }

    /// Download an audio payload.
    ///
    /// `on_progress` receives percentages in `0..=100`, coalesced to the
    /// configured step. The returned buffer is at most
    /// `config.max_file_size` bytes.
    #[instrument(skip(self, on_progress))]
    pub async fn download(
        &self,
        url: &str,
        mut on_progress: impl FnMut(u8) + Send,
    ) -> Result<Bytes> {
        if self.closed.load(Ordering::Acquire) {
            return Err(IngestError::Closed);
        }

        let url = validate_url(url).await?;

        let _permit = self
            .slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| IngestError::Busy)?;

        let task_id = Uuid::new_v4();
        let entry = Arc::new(TaskEntry::new());
        self.active.lock().insert(task_id, Arc::clone(&entry));

        info!(%task_id, %url, "starting download");
        let result = self.run_task(&url, &entry, &mut on_progress).await;

        match &result {
            Ok(data) => {
                entry.set_state(DownloadState::Complete);
                info!(%task_id, bytes = data.len(), "download completed");
            }
            Err(IngestError::Cancelled) => {
                entry.set_state(DownloadState::Cancelled);
                info!(%task_id, "download cancelled");
            }
            Err(e) => {
                entry.set_state(DownloadState::Failed);
                warn!(%task_id, error = %e, "download failed");
            }
        }

        self.active.lock().remove(&task_id);
        result
    }

    async fn run_task(
        &self,
        url: &url::Url,
        entry: &TaskEntry,
        on_progress: &mut (impl FnMut(u8) + Send),
    ) -> Result<Bytes> {
        if entry.token.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        entry.set_state(DownloadState::Downloading);

        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus(status.as_u16()));
        }

        if let Some(content_type) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_audio_content_type(content_type) {
                return Err(IngestError::InvalidContentType(content_type.to_string()));
            }
        }

        let declared = response.content_length();
        if let Some(len) = declared {
            if len > self.config.max_file_size {
                return Err(IngestError::TooLarge {
                    size: len,
                    max: self.config.max_file_size,
                });
            }
        }

        let mut body = BytesMut::with_capacity(declared.unwrap_or(64 * 1024) as usize);
        let mut stream = response.bytes_stream();
        let mut last_reported: u8 = 0;

        while let Some(chunk) = stream.next().await {
            if entry.token.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let chunk = chunk?;
            body.extend_from_slice(&chunk);

            // Re-check after every chunk: content-length may be absent or lying.
            if body.len() as u64 > self.config.max_file_size {
                return Err(IngestError::TooLarge {
                    size: body.len() as u64,
                    max: self.config.max_file_size,
                });
            }

            if let Some(total) = declared.filter(|t| *t > 0) {
                let percent = (body.len() as u64 * 100 / total).min(100) as u8;
                if percent >= last_reported.saturating_add(self.config.progress_step) {
                    last_reported = percent;
                    debug!(percent, "download progress");
                    on_progress(percent);
                }
            }
        }

        on_progress(100);
        Ok(body.freeze())
    }

    /// Cancel an in-flight download. No-op for unknown ids.
    pub fn cancel(&self, task_id: Uuid) {
        if let Some(entry) = self.active.lock().get(&task_id) {
            entry.token.cancel();
            entry.set_state(DownloadState::Cancelled);
            info!(%task_id, "cancel requested");
        }
    }

    /// Current state of an in-flight download, if still tracked.
    pub fn status(&self, task_id: Uuid) -> Option<DownloadState> {
        self.active.lock().get(&task_id).map(|e| *e.state.lock())
    }

    /// Ids of all in-flight downloads.
    pub fn active_tasks(&self) -> Vec<Uuid> {
        self.active.lock().keys().copied().collect()
    }

    /// Number of in-flight downloads.
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }

    /// Cancel everything and refuse further work.
    pub fn shutdown(&self) {
        info!("shutting down download coordinator");
        self.closed.store(true, Ordering::Release);
        for entry in self.active.lock().values() {
            entry.token.cancel();
            entry.set_state(DownloadState::Cancelled);
        }
    }
}

/// Content types accepted for audio downloads: anything under `audio/`,
/// plus the generic binary types some hosts serve audio with.
fn is_audio_content_type(content_type: &str) -> bool {
    let ct = content_type.to_ascii_lowercase();
    ct.contains("audio/")
        || ct.contains("application/octet-stream")
        || ct.contains("application/ogg")
        || ct.contains("application/binary")
}
