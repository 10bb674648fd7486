//! # Ingest Configuration

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for downloads and upload rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum accepted payload size in bytes.
    ///
    /// Default: 50 MB.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// End-to-end download timeout in seconds.
    ///
    /// Default: 30.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Simultaneous download slots. Requests beyond this fail fast rather
    /// than queueing.
    ///
    /// Default: 3.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Minimum progress advance, in percentage points, between callback
    /// invocations.
    ///
    /// Default: 25.
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,

    /// Maximum uploads per uploader inside the rolling window.
    ///
    /// Default: 3.
    #[serde(default = "default_max_uploads_per_window")]
    pub max_uploads_per_window: usize,

    /// Cooldown between consecutive uploads from one uploader, in seconds.
    ///
    /// Default: 10.
    #[serde(default = "default_upload_cooldown_secs")]
    pub upload_cooldown_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            download_timeout_secs: default_download_timeout_secs(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            progress_step: default_progress_step(),
            max_uploads_per_window: default_max_uploads_per_window(),
            upload_cooldown_secs: default_upload_cooldown_secs(),
        }
    }
}

impl IngestConfig {
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn upload_cooldown(&self) -> Duration {
        Duration::from_secs(self.upload_cooldown_secs)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| IngestError::Config(format!("read failed: {}", e)))?;
        serde_json::from_str(&json).map_err(|e| IngestError::Config(format!("parse failed: {}", e)))
    }

    /// Validate field ranges.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_file_size == 0 || self.max_file_size > 100 * 1024 * 1024 {
            return Err(format!(
                "max_file_size must be between 1 and 104857600 bytes, got {}",
                self.max_file_size
            ));
        }
        if self.download_timeout_secs == 0 || self.download_timeout_secs > 300 {
            return Err(format!(
                "download_timeout_secs must be between 1 and 300, got {}",
                self.download_timeout_secs
            ));
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            return Err(format!(
                "progress_step must be between 1 and 100, got {}",
                self.progress_step
            ));
        }
        Ok(())
    }
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024
}

fn default_download_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_downloads() -> usize {
    3
}

fn default_progress_step() -> u8 {
    25
}

fn default_max_uploads_per_window() -> usize {
    3
}

fn default_upload_cooldown_secs() -> u64 {
    10
}
