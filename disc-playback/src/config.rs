//! # Playback Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the playback session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Target sample rate handed to frame sources, in Hz.
    ///
    /// Default: 48000 (the locational channel path). The legacy static path
    /// uses 24000.
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,

    /// Nominal frame duration in milliseconds.
    ///
    /// Default: 20 (960 samples at 48 kHz).
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,

    /// Audible range of locational channels, in blocks.
    ///
    /// Default: 64.
    #[serde(default = "default_audio_range")]
    pub audio_range: f64,

    /// Volume category tag registered with the transport.
    #[serde(default = "default_category")]
    pub category: String,

    /// Completion monitor scan interval in milliseconds.
    ///
    /// Default: 1000.
    #[serde(default = "default_monitor_interval_ms")]
    pub monitor_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
            frame_ms: default_frame_ms(),
            audio_range: default_audio_range(),
            category: default_category(),
            monitor_interval_ms: default_monitor_interval_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Validate field ranges.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.target_sample_rate == 0 {
            return Err("target_sample_rate must be positive".to_string());
        }
        if self.frame_ms == 0 || self.frame_ms > 1000 {
            return Err(format!(
                "frame_ms must be between 1 and 1000, got {}",
                self.frame_ms
            ));
        }
        if self.audio_range <= 0.0 {
            return Err("audio_range must be positive".to_string());
        }
        if self.monitor_interval_ms == 0 {
            return Err("monitor_interval_ms must be positive".to_string());
        }
        Ok(())
    }
}

fn default_target_sample_rate() -> u32 {
    48_000
}

fn default_frame_ms() -> u32 {
    20
}

fn default_audio_range() -> f64 {
    64.0
}

fn default_category() -> String {
    "audio_disc".to_string()
}

fn default_monitor_interval_ms() -> u64 {
    1000
}
