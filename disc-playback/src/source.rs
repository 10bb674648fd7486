//! # Audio Frame Source
//!
//! Pull-based, single-pass frame iterator over one audio payload. A source
//! is not restartable; replaying means constructing a new one.
//!
//! On the first pull the source lazily initializes:
//! - containers known to be undecodable in this path (WebM, M4A without a
//!   prior transcoder pass) fail fast with a descriptive error,
//! - decodable payloads are decoded, remixed to mono, resampled to the
//!   target rate, and quantized to i16,
//! - payloads the decoding layer rejects switch to fallback mode and are
//!   replayed as fixed-size raw byte chunks. Fallback keeps transport
//!   delivery alive; it is a degraded mode, not an error.
//!
//! Every PCM frame has exactly `samples_per_frame` samples; the final frame
//! is zero-padded rather than emitted short.

use crate::decode::decode_to_pcm;
use crate::error::{PlaybackError, Result};
use crate::resample::{downmix_mono, quantize_i16, resample_linear};
use crate::transport::Frame;
use bytes::Bytes;
use disc_store::{classify, AudioFormat};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw-chunk size used in fallback mode.
pub const RAW_CHUNK_BYTES: usize = 4096;

/// Pacing interval for raw chunks, which have no nominal duration.
pub const RAW_CHUNK_INTERVAL: Duration = Duration::from_millis(10);

/// Target frame geometry for a transport path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSpec {
    /// Target sample rate in Hz.
    pub sample_rate: u32,
    /// Nominal frame duration in milliseconds.
    pub frame_ms: u32,
}

impl FrameSpec {
    /// Locational playback target: 960 samples per 20 ms frame at 48 kHz.
    pub const fn locational() -> Self {
        Self {
            sample_rate: 48_000,
            frame_ms: 20,
        }
    }

    /// Legacy static-channel target: 24 kHz with 40 ms chunks.
    pub const fn static_channel() -> Self {
        Self {
            sample_rate: 24_000,
            frame_ms: 40,
        }
    }

    /// Samples per frame: `frame_ms * sample_rate / 1000`.
    pub const fn samples_per_frame(&self) -> usize {
        (self.frame_ms as usize * self.sample_rate as usize) / 1000
    }

    /// Nominal wall-clock duration of one frame.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.frame_ms))
    }
}

enum SourceState {
    Pending,
    Pcm { samples: Vec<i16>, pos: usize },
    Raw { pos: usize },
    Finished,
}

/// Single-pass frame iterator over one payload.
pub struct AudioFrameSource {
    data: Bytes,
    spec: FrameSpec,
    state: SourceState,
    degraded: bool,
}

impl AudioFrameSource {
    pub fn new(data: Bytes, spec: FrameSpec) -> Self {
        Self {
            data,
            spec,
            state: SourceState::Pending,
            degraded: false,
        }
    }

    /// Pull the next frame. `Ok(None)` signals end of stream.
    ///
    /// The only error surfaced here is [`PlaybackError::UndecodableContainer`]
    /// on the first pull; decode failures degrade silently to fallback mode.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if let SourceState::Pending = self.state {
            self.initialize()?;
        }

        let per_frame = self.spec.samples_per_frame();
        let data = &self.data;

        let frame = match &mut self.state {
            SourceState::Pcm { samples, pos } => {
                if *pos >= samples.len() {
                    None
                } else {
                    let end = (*pos + per_frame).min(samples.len());
                    let mut frame = samples[*pos..end].to_vec();
                    frame.resize(per_frame, 0);
                    *pos = end;
                    Some(Frame::Pcm(frame))
                }
            }
            SourceState::Raw { pos } => {
                if *pos >= data.len() {
                    None
                } else {
                    let end = (*pos + RAW_CHUNK_BYTES).min(data.len());
                    let chunk = data.slice(*pos..end);
                    *pos = end;
                    Some(Frame::Raw(chunk))
                }
            }
            SourceState::Finished => None,
            SourceState::Pending => unreachable!("initialized above"),
        };

        if frame.is_none() {
            self.state = SourceState::Finished;
        }
        Ok(frame)
    }

    /// Whether the stream (PCM or fallback) is exhausted.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SourceState::Finished)
    }

    /// Whether fallback mode was engaged.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn initialize(&mut self) -> Result<()> {
        let format = classify(&self.data);

        if let Some(format) = format {
            if format.requires_transcode() {
                self.state = SourceState::Finished;
                return Err(PlaybackError::UndecodableContainer(format));
            }
        }

        match decode_to_pcm(&self.data, format) {
            Ok(decoded) => {
                let mono = downmix_mono(&decoded.samples, decoded.channels);
                let resampled = resample_linear(&mono, decoded.sample_rate, self.spec.sample_rate);
                let samples = quantize_i16(&resampled);
                debug!(
                    src_rate = decoded.sample_rate,
                    dst_rate = self.spec.sample_rate,
                    samples = samples.len(),
                    "frame source ready"
                );
                self.state = SourceState::Pcm { samples, pos: 0 };
                Ok(())
            }
            Err(e) if e.is_degradable() => {
                info!(error = %e, "decoding failed, streaming raw chunks");
                self.degraded = true;
                self.state = SourceState::Raw { pos: 0 };
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "frame source initialization failed");
                self.state = SourceState::Finished;
                Err(e)
            }
        }
    }
}
