//! # Container Decoding
//!
//! Decodes an in-memory audio payload to interleaved f32 PCM using
//! Symphonia's probe → demux → decode pipeline.
//!
//! Error handling policy, per packet:
//! - decode errors and I/O errors skip the packet (corrupt frames are
//!   common in real uploads), up to a consecutive-error cap
//! - `UnexpectedEof` is the normal end of stream
//! - anything else is fatal
//!
//! Callers decide what a fatal decode failure means; the frame source
//! downgrades it to raw-chunk fallback.

use crate::error::{PlaybackError, Result};
use bytes::Bytes;
use disc_store::AudioFormat;
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Fully decoded PCM stream.
pub struct DecodedPcm {
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Vec<f32>,
    /// Channel count of the decoded stream.
    pub channels: usize,
    /// Source sample rate in Hz.
    pub sample_rate: u32,
}

/// Decode an entire payload to PCM.
///
/// `format` seeds the probe hint; `None` lets Symphonia auto-detect.
pub fn decode_to_pcm(data: &Bytes, format: Option<AudioFormat>) -> Result<DecodedPcm> {
    let cursor = Cursor::new(data.to_vec());
    let media_source = Box::new(cursor) as Box<dyn MediaSource>;
    let stream = MediaSourceStream::new(media_source, Default::default());

    let mut hint = Hint::new();
    if let Some(format) = format {
        hint.with_extension(format.extension());
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| PlaybackError::Probe(e.to_string()))?;
    let mut reader = probed.format;

    let (track_id, sample_rate, codec_params) = {
        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlaybackError::Probe("no audio tracks".to_string()))?;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PlaybackError::Probe("missing sample rate".to_string()))?;
        (track.id, sample_rate, track.codec_params.clone())
    };

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;

    let mut samples = Vec::new();
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut consecutive_errors = 0;

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                // Track list changed mid-stream (chained OGG); keep what we
                // have.
                warn!("decoder reset required, truncating stream");
                break;
            }
            Err(e) => {
                if samples.is_empty() {
                    return Err(PlaybackError::Decode(e.to_string()));
                }
                warn!(error = %e, "stopping decode after reader error");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                consecutive_errors = 0;
                channels = decoded.spec().channels.count();
                append_interleaved(&decoded, &mut samples);
            }
            Err(e @ SymphoniaError::DecodeError(_)) | Err(e @ SymphoniaError::IoError(_)) => {
                consecutive_errors += 1;
                warn!(
                    error = %e,
                    attempt = consecutive_errors,
                    "skipping undecodable packet"
                );
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    return Err(PlaybackError::Decode(format!(
                        "stream corrupt after {} failed packets",
                        MAX_CONSECUTIVE_ERRORS
                    )));
                }
            }
            Err(e) => return Err(PlaybackError::Decode(e.to_string())),
        }
    }

    if samples.is_empty() || channels == 0 {
        return Err(PlaybackError::Decode("stream produced no samples".to_string()));
    }

    debug!(
        samples = samples.len(),
        channels, sample_rate, "decoded payload to PCM"
    );
    Ok(DecodedPcm {
        samples,
        channels,
        sample_rate,
    })
}

/// Append a decoded buffer as interleaved f32, converting from whatever
/// sample format and layout the codec produced.
fn append_interleaved(buffer: &AudioBufferRef<'_>, out: &mut Vec<f32>) {
    fn extend<T>(buf: &AudioBuffer<T>, out: &mut Vec<f32>)
    where
        T: Sample + IntoSample<f32>,
    {
        let channels = buf.spec().channels.count();
        let frames = buf.frames();
        out.reserve(frames * channels);
        for frame in 0..frames {
            for channel in 0..channels {
                out.push(buf.chan(channel)[frame].into_sample());
            }
        }
    }

    match buffer {
        AudioBufferRef::U8(buf) => extend(&**buf, out),
        AudioBufferRef::U16(buf) => extend(&**buf, out),
        AudioBufferRef::U24(buf) => extend(&**buf, out),
        AudioBufferRef::U32(buf) => extend(&**buf, out),
        AudioBufferRef::S8(buf) => extend(&**buf, out),
        AudioBufferRef::S16(buf) => extend(&**buf, out),
        AudioBufferRef::S24(buf) => extend(&**buf, out),
        AudioBufferRef::S32(buf) => extend(&**buf, out),
        AudioBufferRef::F32(buf) => extend(&**buf, out),
        AudioBufferRef::F64(buf) => extend(&**buf, out),
    }
}
