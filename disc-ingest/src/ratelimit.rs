//! # Upload Rate Limiter
//!
//! Per-uploader throttling with two independent rules:
//! - a cooldown between consecutive uploads, and
//! - a rolling window capping total uploads per minute.
//!
//! Window entries are pruned lazily on each check; there is no background
//! timer.

use crate::error::{IngestError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Default)]
struct UploaderRecord {
    uploads: Vec<Instant>,
    last_upload: Option<Instant>,
}

/// Rolling-window upload rate limiter keyed by uploader name.
pub struct UploadRateLimiter {
    records: Mutex<HashMap<String, UploaderRecord>>,
    max_per_window: usize,
    window: Duration,
    cooldown: Duration,
}

impl UploadRateLimiter {
    /// Standard limiter with a 60-second window.
    pub fn new(max_per_window: usize, cooldown: Duration) -> Self {
        Self::with_window(max_per_window, cooldown, Duration::from_secs(60))
    }

    /// Limiter with an explicit window length.
    pub fn with_window(max_per_window: usize, cooldown: Duration, window: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            max_per_window,
            window,
            cooldown,
        }
    }

    /// Check whether `uploader` may upload right now.
    ///
    /// The cooldown is checked first, then the rolling window. Entries older
    /// than the window are pruned as a side effect.
    pub fn check(&self, uploader: &str) -> Result<()> {
        let now = Instant::now();
        let mut records = self.records.lock();
        let record = records.entry(uploader.to_string()).or_default();

        if let Some(last) = record.last_upload {
            let elapsed = now.duration_since(last);
            if elapsed < self.cooldown {
                let remaining = self.cooldown - elapsed;
                return Err(IngestError::UploadCooldown {
                    remaining_secs: remaining.as_secs().max(1),
                });
            }
        }

        record.uploads.retain(|t| now.duration_since(*t) <= self.window);

        if record.uploads.len() >= self.max_per_window {
            return Err(IngestError::UploadLimit {
                max_per_window: self.max_per_window,
            });
        }

        Ok(())
    }

    /// Record a successful upload for `uploader`.
    pub fn record(&self, uploader: &str) {
        let now = Instant::now();
        let mut records = self.records.lock();
        let record = records.entry(uploader.to_string()).or_default();
        record.uploads.push(now);
        record.last_upload = Some(now);
    }

    /// Remaining cooldown for `uploader`, zero when none applies.
    pub fn remaining_cooldown(&self, uploader: &str) -> Duration {
        let records = self.records.lock();
        let Some(last) = records.get(uploader).and_then(|r| r.last_upload) else {
            return Duration::ZERO;
        };
        self.cooldown
            .checked_sub(last.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Forget one uploader's history.
    pub fn clear(&self, uploader: &str) {
        self.records.lock().remove(uploader);
    }

    /// Forget all history.
    pub fn clear_all(&self) {
        self.records.lock().clear();
    }
}
