//! # PCM Conversion
//!
//! Conversion from decoded interleaved f32 PCM to the transport target
//! format: mono, 16-bit signed little-endian, at a caller-chosen rate.
//!
//! Conversion runs in two steps, matching the stream path it replaces:
//! first remix to mono, then linearly resample to the target rate. Linear
//! interpolation keeps output lengths exactly `ceil(n * dst / src)`, which
//! the frame-count guarantees downstream rely on.

/// Remix interleaved multi-channel samples to mono by averaging channels.
pub fn downmix_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Linearly resample mono samples from `src_rate` to `dst_rate`.
pub fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || input.is_empty() || src_rate == 0 || dst_rate == 0 {
        return input.to_vec();
    }

    let out_len = resampled_len(input.len(), src_rate, dst_rate);
    let step = f64::from(src_rate) / f64::from(dst_rate);
    let last = input.len() - 1;

    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = (pos as usize).min(last);
        let next = (idx + 1).min(last);
        let frac = (pos - idx as f64) as f32;
        let sample = input[idx] + (input[next] - input[idx]) * frac;
        out.push(sample);
    }
    out
}

/// Output length of [`resample_linear`]: `ceil(n * dst / src)`.
pub fn resampled_len(input_len: usize, src_rate: u32, dst_rate: u32) -> usize {
    if src_rate == 0 || dst_rate == 0 || src_rate == dst_rate {
        return input_len;
    }
    let n = input_len as u64 * u64::from(dst_rate);
    (n.div_ceil(u64::from(src_rate))) as usize
}

/// Quantize normalized f32 samples to signed 16-bit.
pub fn quantize_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
        .collect()
}
