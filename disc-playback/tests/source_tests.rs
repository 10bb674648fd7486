//! Integration tests for the frame source over real WAV payloads: frame
//! counts, uniform frame length, zero padding, resampling, and the
//! undecodable/fallback paths.

use bytes::Bytes;
use disc_playback::{AudioFrameSource, Frame, FrameSpec, PlaybackError};

/// Canonical 16-bit PCM WAV: 44-byte header plus `samples`.
fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Bytes {
    let payload_len = samples.len() * 2;
    let byte_rate = sample_rate * 2;
    let mut data = Vec::with_capacity(44 + payload_len);
    data.extend_from_slice(b"RIFF");
    data.extend_from_slice(&(36 + payload_len as u32).to_le_bytes());
    data.extend_from_slice(b"WAVE");
    data.extend_from_slice(b"fmt ");
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes()); // PCM
    data.extend_from_slice(&1u16.to_le_bytes()); // mono
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&byte_rate.to_le_bytes());
    data.extend_from_slice(&2u16.to_le_bytes()); // block align
    data.extend_from_slice(&16u16.to_le_bytes());
    data.extend_from_slice(b"data");
    data.extend_from_slice(&(payload_len as u32).to_le_bytes());
    for sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    Bytes::from(data)
}

fn collect_pcm_frames(source: &mut AudioFrameSource) -> Vec<Vec<i16>> {
    let mut frames = Vec::new();
    while let Some(frame) = source.next_frame().unwrap() {
        match frame {
            Frame::Pcm(samples) => frames.push(samples),
            Frame::Raw(_) => panic!("expected PCM frames"),
        }
    }
    frames
}

#[test]
fn wav_at_target_rate_chunks_into_uniform_frames() {
    // 2400 samples at 48 kHz = 2.5 frames of 960.
    let samples = vec![1000i16; 2400];
    let mut source = AudioFrameSource::new(wav_bytes(48_000, &samples), FrameSpec::locational());

    let frames = collect_pcm_frames(&mut source);
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert_eq!(frame.len(), 960);
    }
    assert!(source.is_finished());
    assert!(!source.is_degraded());

    // The final frame carries 480 real samples and 480 samples of padding.
    let last = frames.last().unwrap();
    assert!(last[..480].iter().all(|&s| s != 0));
    assert!(last[480..].iter().all(|&s| s == 0));
}

#[test]
fn exact_multiple_needs_no_padding() {
    let samples = vec![1000i16; 1920];
    let mut source = AudioFrameSource::new(wav_bytes(48_000, &samples), FrameSpec::locational());

    let frames = collect_pcm_frames(&mut source);
    assert_eq!(frames.len(), 2);
    assert!(frames.iter().all(|f| f.len() == 960));
    assert!(frames[1].iter().all(|&s| s != 0));
}

#[test]
fn source_rate_is_resampled_to_target() {
    // 44.1 kHz input resampled up to 48 kHz: ceil(4410 * 48000 / 44100)
    // = 4800 samples = 5 exact frames.
    let samples = vec![1000i16; 4410];
    let mut source = AudioFrameSource::new(wav_bytes(44_100, &samples), FrameSpec::locational());

    let frames = collect_pcm_frames(&mut source);
    assert_eq!(frames.len(), 5);
    assert!(frames.iter().all(|f| f.len() == 960));
}

#[test]
fn static_channel_target_downsamples() {
    // 48 kHz source to the 24 kHz static path: 4800 → 2400 samples,
    // 960-sample frames → ceil(2400 / 960) = 3 frames.
    let samples = vec![1000i16; 4800];
    let mut source =
        AudioFrameSource::new(wav_bytes(48_000, &samples), FrameSpec::static_channel());

    let frames = collect_pcm_frames(&mut source);
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|f| f.len() == 960));
}

#[test]
fn source_is_single_pass() {
    let samples = vec![1000i16; 960];
    let mut source = AudioFrameSource::new(wav_bytes(48_000, &samples), FrameSpec::locational());

    assert_eq!(collect_pcm_frames(&mut source).len(), 1);
    // Exhausted: further pulls keep reporting end of stream.
    assert!(source.next_frame().unwrap().is_none());
    assert!(source.next_frame().unwrap().is_none());
}

#[test]
fn webm_and_m4a_fail_fast() {
    let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3];
    webm.resize(64, 0);
    let mut source = AudioFrameSource::new(Bytes::from(webm), FrameSpec::locational());
    assert!(matches!(
        source.next_frame(),
        Err(PlaybackError::UndecodableContainer(_))
    ));

    let mut m4a = vec![0x00, 0x00, 0x00, 0x20];
    m4a.extend_from_slice(b"ftypM4A ");
    m4a.resize(64, 0);
    let mut source = AudioFrameSource::new(Bytes::from(m4a), FrameSpec::locational());
    assert!(matches!(
        source.next_frame(),
        Err(PlaybackError::UndecodableContainer(_))
    ));
}

#[test]
fn corrupt_mp3_payload_degrades_to_raw_chunks() {
    // An ID3 signature over bytes that contain no MPEG frame sync:
    // classification succeeds but decoding cannot, so fallback engages.
    let mut data = b"ID3".to_vec();
    data.resize(10_000, 0x25);
    let mut source = AudioFrameSource::new(Bytes::from(data.clone()), FrameSpec::locational());

    let mut total = 0;
    let mut chunks = 0;
    while let Some(frame) = source.next_frame().unwrap() {
        match frame {
            Frame::Raw(chunk) => {
                total += chunk.len();
                chunks += 1;
            }
            Frame::Pcm(_) => panic!("expected raw fallback"),
        }
    }

    assert!(source.is_degraded());
    assert_eq!(total, data.len());
    assert_eq!(chunks, data.len().div_ceil(4096));
}
