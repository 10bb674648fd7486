//! # Format Classification
//!
//! Magic-byte sniffing for the handful of container formats the pipeline
//! accepts, plus allow-list validation for playback.
//!
//! Classification is deterministic: signatures are checked in a fixed
//! precedence order and the first match wins. Anything shorter than
//! [`MIN_SNIFF_BYTES`] is never classified.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Hard ceiling on accepted payload size (50 MB).
pub const MAX_AUDIO_BYTES: u64 = 50 * 1024 * 1024;

/// Minimum payload length required for classification.
pub const MIN_SNIFF_BYTES: usize = 12;

// Magic-byte signatures, in precedence order.
const MP3_ID3: &[u8] = b"ID3";
const MP3_SYNC: &[u8] = &[0xFF, 0xFB];
const MP3_SYNC_ALT: &[u8] = &[0xFF, 0xF3];
const OGG_MAGIC: &[u8] = b"OggS";
const RIFF_MAGIC: &[u8] = b"RIFF";
const WAVE_MAGIC: &[u8] = b"WAVE";
const EBML_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];
const FTYP_MAGIC: &[u8] = b"ftyp";
const M4A_BRANDS: [&[u8]; 4] = [b"M4A ", b"mp41", b"mp42", b"isom"];

/// Container formats recognized by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Ogg,
    Wav,
    Webm,
    M4a,
}

impl AudioFormat {
    /// All formats the pipeline can classify.
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Mp3,
        AudioFormat::Ogg,
        AudioFormat::Wav,
        AudioFormat::Webm,
        AudioFormat::M4a,
    ];

    /// File extension used for on-disk storage.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::M4a => "m4a",
        }
    }

    /// Parse the lowercase extension form produced by [`extension`].
    ///
    /// [`extension`]: AudioFormat::extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "mp3" => Some(AudioFormat::Mp3),
            "ogg" => Some(AudioFormat::Ogg),
            "wav" => Some(AudioFormat::Wav),
            "webm" => Some(AudioFormat::Webm),
            "m4a" => Some(AudioFormat::M4a),
            _ => None,
        }
    }

    /// Returns `true` for containers that cannot be decoded directly and
    /// require an external transcoder pass first.
    pub fn requires_transcode(&self) -> bool {
        matches!(self, AudioFormat::Webm | AudioFormat::M4a)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Classify a payload by its magic bytes.
///
/// Returns `None` when no signature matches or the payload is shorter than
/// [`MIN_SNIFF_BYTES`]. Precedence: ID3/MPEG sync, `OggS`, `RIFF`+`WAVE`,
/// EBML, `ftyp`.
pub fn classify(data: &[u8]) -> Option<AudioFormat> {
    if data.len() < MIN_SNIFF_BYTES {
        return None;
    }

    if data.starts_with(MP3_ID3) || data.starts_with(MP3_SYNC) || data.starts_with(MP3_SYNC_ALT) {
        return Some(AudioFormat::Mp3);
    }
    if data.starts_with(OGG_MAGIC) {
        return Some(AudioFormat::Ogg);
    }
    if data.starts_with(RIFF_MAGIC) && &data[8..12] == WAVE_MAGIC {
        return Some(AudioFormat::Wav);
    }
    if data.starts_with(EBML_MAGIC) {
        return Some(AudioFormat::Webm);
    }
    if is_mp4_container(data) {
        return Some(AudioFormat::M4a);
    }

    None
}

/// MP4/M4A containers carry a 4-byte size field followed by `ftyp`; when at
/// least 16 bytes are present the brand string at offset 8 must also match.
fn is_mp4_container(data: &[u8]) -> bool {
    if &data[4..8] != FTYP_MAGIC {
        return false;
    }
    if data.len() >= 16 {
        return M4A_BRANDS.iter().any(|brand| &data[8..12] == *brand);
    }
    true
}

/// Validate a payload for storage and playback.
///
/// Beyond classification this enforces the size ceiling and the configured
/// allow-list. A recognized-but-disallowed format is reported distinctly
/// from unrecognizable bytes.
pub fn validate(data: &[u8], allowed: &[AudioFormat]) -> Result<AudioFormat> {
    if data.is_empty() {
        return Err(StoreError::InvalidInput("audio data is empty"));
    }
    if data.len() as u64 > MAX_AUDIO_BYTES {
        return Err(StoreError::TooLarge {
            size: data.len() as u64,
            max: MAX_AUDIO_BYTES,
        });
    }

    let format = classify(data).ok_or(StoreError::UnrecognizedFormat)?;
    if !allowed.contains(&format) {
        return Err(StoreError::UnsupportedFormat(format));
    }

    debug!(%format, size = data.len(), "audio format validated");
    Ok(format)
}
