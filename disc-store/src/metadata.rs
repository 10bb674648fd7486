//! # Metadata Estimation
//!
//! Derives duration, bitrate, and sample rate from raw bytes plus the
//! classified format. Estimation never fails: when nothing can be read the
//! fields fall back to zeros and a generic title.
//!
//! Only WAV headers are parsed exactly. Compressed formats use fixed nominal
//! constants (128 kbps, 44.1 kHz) because no tag parser is in scope; this is
//! a documented approximation, not a bug.

use crate::format::AudioFormat;
use crate::model::AudioMetadata;
use tracing::debug;

/// Nominal bitrate assumed for compressed formats, in kbps.
const NOMINAL_BITRATE_KBPS: u32 = 128;

/// Nominal sample rate assumed when the header cannot be read, in Hz.
const NOMINAL_SAMPLE_RATE_HZ: u32 = 44_100;

/// Uncompressed CD-quality bitrate reported for WAV, in kbps.
const WAV_BITRATE_KBPS: u32 = 1_411;

/// Canonical RIFF/WAVE header length.
const WAV_HEADER_LEN: usize = 44;

/// Title used until real tag parsing exists.
const DEFAULT_TITLE: &str = "Custom Audio";

/// Estimate metadata for a classified payload.
pub fn estimate(data: &[u8], format: AudioFormat) -> AudioMetadata {
    let metadata = AudioMetadata {
        format,
        duration_ms: estimate_duration_ms(data, format),
        bitrate_kbps: estimate_bitrate_kbps(format),
        sample_rate_hz: estimate_sample_rate_hz(data, format),
        title: DEFAULT_TITLE.to_string(),
    };

    debug!(
        %format,
        duration_ms = metadata.duration_ms,
        bitrate_kbps = metadata.bitrate_kbps,
        "estimated audio metadata"
    );
    metadata
}

fn estimate_duration_ms(data: &[u8], format: AudioFormat) -> u64 {
    match format {
        AudioFormat::Wav => wav_duration_ms(data),
        // Compressed: duration ≈ size * 8 / bitrate.
        AudioFormat::Mp3 | AudioFormat::Ogg | AudioFormat::Webm | AudioFormat::M4a => {
            data.len() as u64 * 8 / u64::from(NOMINAL_BITRATE_KBPS)
        }
    }
}

fn estimate_bitrate_kbps(format: AudioFormat) -> u32 {
    match format {
        AudioFormat::Wav => WAV_BITRATE_KBPS,
        _ => NOMINAL_BITRATE_KBPS,
    }
}

fn estimate_sample_rate_hz(data: &[u8], format: AudioFormat) -> u32 {
    if format == AudioFormat::Wav {
        if let Some(rate) = read_le_u32(data, 24) {
            return rate;
        }
    }
    NOMINAL_SAMPLE_RATE_HZ
}

/// WAV duration from the header byte-rate field: the sample rate lives at
/// offset 24 and the byte rate at offset 28, both little-endian u32.
fn wav_duration_ms(data: &[u8]) -> u64 {
    if data.len() < WAV_HEADER_LEN {
        return 0;
    }
    match read_le_u32(data, 28) {
        Some(byte_rate) if byte_rate > 0 => {
            let payload = (data.len() - WAV_HEADER_LEN) as u64;
            payload * 1000 / u64::from(byte_rate)
        }
        _ => 0,
    }
}

fn read_le_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
