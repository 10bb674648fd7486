//! # External Transcoder Seam
//!
//! WebM and M4A containers cannot be decoded by the playback path directly;
//! an out-of-process tool converts them to a supported container before the
//! bytes re-enter the pipeline. The core treats that tool as a black box:
//! success means "classify and try again", failure means the original bytes
//! stand.

use crate::format::{classify, AudioFormat};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

/// Out-of-process converter from an unsupported container to a supported one.
#[async_trait]
pub trait ExternalTranscoder: Send + Sync {
    /// Attempt to convert `data` out of `from`. Returns the converted bytes
    /// on success, `None` when the tool is unavailable or conversion failed.
    async fn try_convert(&self, data: &Bytes, from: AudioFormat) -> Option<Bytes>;
}

/// Run the transcoder for containers that need it and re-classify the result.
///
/// Payloads in directly decodable formats pass through untouched. When
/// conversion succeeds the output is re-classified so downstream stages see
/// the new signature; when it fails (or produces unrecognizable bytes) the
/// original payload and format are kept.
pub async fn transcode_if_needed(
    data: Bytes,
    format: AudioFormat,
    transcoder: &dyn ExternalTranscoder,
) -> (Bytes, AudioFormat) {
    if !format.requires_transcode() {
        return (data, format);
    }

    match transcoder.try_convert(&data, format).await {
        Some(converted) => match classify(&converted) {
            Some(new_format) => {
                debug!(from = %format, to = %new_format, "external transcode succeeded");
                (converted, new_format)
            }
            None => {
                warn!(from = %format, "transcoder output is unrecognizable, keeping original");
                (data, format)
            }
        },
        None => {
            warn!(from = %format, "external transcoder unavailable or failed");
            (data, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transcoder that converts everything into an OggS-signed buffer.
    struct ToOgg;

    #[async_trait]
    impl ExternalTranscoder for ToOgg {
        async fn try_convert(&self, _data: &Bytes, _from: AudioFormat) -> Option<Bytes> {
            let mut out = b"OggS".to_vec();
            out.resize(32, 0);
            Some(Bytes::from(out))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl ExternalTranscoder for AlwaysFails {
        async fn try_convert(&self, _data: &Bytes, _from: AudioFormat) -> Option<Bytes> {
            None
        }
    }

    fn webm_bytes() -> Bytes {
        let mut data = vec![0x1A, 0x45, 0xDF, 0xA3];
        data.resize(32, 0);
        Bytes::from(data)
    }

    #[tokio::test]
    async fn webm_is_converted_and_reclassified() {
        let (out, format) = transcode_if_needed(webm_bytes(), AudioFormat::Webm, &ToOgg).await;
        assert_eq!(format, AudioFormat::Ogg);
        assert!(out.starts_with(b"OggS"));
    }

    #[tokio::test]
    async fn decodable_formats_pass_through() {
        let mp3 = {
            let mut data = b"ID3".to_vec();
            data.resize(32, 0);
            Bytes::from(data)
        };
        let (out, format) = transcode_if_needed(mp3.clone(), AudioFormat::Mp3, &ToOgg).await;
        assert_eq!(format, AudioFormat::Mp3);
        assert_eq!(out, mp3);
    }

    #[tokio::test]
    async fn failed_conversion_keeps_original() {
        let data = webm_bytes();
        let (out, format) =
            transcode_if_needed(data.clone(), AudioFormat::Webm, &AlwaysFails).await;
        assert_eq!(format, AudioFormat::Webm);
        assert_eq!(out, data);
    }
}
