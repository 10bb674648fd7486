//! # Store Configuration

use crate::error::{Result, StoreError};
use crate::format::AudioFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory for audio files and the metadata index.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Maximum number of fully hydrated records kept in memory.
    ///
    /// Default: 50.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Formats accepted for storage and playback.
    #[serde(default = "default_allowed_formats")]
    pub allowed_formats: Vec<AudioFormat>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            cache_capacity: default_cache_capacity(),
            allowed_formats: default_allowed_formats(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Save configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate field ranges.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be at least 1".to_string());
        }
        if self.allowed_formats.is_empty() {
            return Err("allowed_formats cannot be empty".to_string());
        }
        Ok(())
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("audiodisc")
}

fn default_cache_capacity() -> usize {
    50
}

fn default_allowed_formats() -> Vec<AudioFormat> {
    vec![
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::Wav,
        AudioFormat::Webm,
        AudioFormat::M4a,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_capacity, 50);
    }

    #[test]
    fn json_round_trip_applies_defaults() {
        let config: StoreConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.allowed_formats.len(), 5);

        let json = serde_json::to_string(&config).unwrap();
        let back: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cache_capacity, config.cache_capacity);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = StoreConfig {
            cache_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
