//! Best-effort duration extraction without full decoding.
//!
//! Small files go through a symphonia format probe, which reads container
//! metadata the same way a media element would; when the probe reports no
//! frame count (common for CBR MP3 without a Xing header), the manual
//! header parsers take over. Large files skip the probe and parse just
//! enough of the container header by hand; an unrecognized extension falls
//! back to the probe regardless of size.
//!
//! This module never fails: every parse error, short read, or probe
//! failure degrades to `DurationConfidence::Unavailable`. The caller
//! treats that as a soft warning, not a defect.

pub mod mp3;
pub mod mp4;
pub mod reader;
pub mod wav;

use std::sync::Arc;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::models::blob::{read_range_async, AudioBlob};
use crate::models::policy::UploadPolicy;
use crate::models::verdict::DurationEstimate;

/// Extract the blob's play duration in minutes.
pub async fn extract_duration_minutes(
    blob: Arc<dyn AudioBlob>,
    policy: &UploadPolicy,
) -> DurationEstimate {
    if blob.len() < policy.header_parse_threshold_bytes {
        return probe_duration(blob).await;
    }

    let extension = blob.extension();
    let window_size = match extension.as_deref() {
        Some("mp3") => mp3::SCAN_WINDOW_BYTES,
        Some("m4a") | Some("mp4") => mp4::SCAN_WINDOW_BYTES,
        Some("wav") => wav::HEADER_BYTES,
        _ => return probe_duration(blob).await,
    };

    let minutes = header_window(&blob, window_size)
        .await
        .and_then(|w| parse_header_window(&w, extension.as_deref(), blob.len()));

    match minutes {
        Some(m) => DurationEstimate::measured(m),
        None => DurationEstimate::unavailable(),
    }
}

/// Read the first `size` bytes of the blob, or `None` on any read failure.
async fn header_window(blob: &Arc<dyn AudioBlob>, size: u64) -> Option<Vec<u8>> {
    match read_range_async(blob.clone(), 0, size).await {
        Ok(window) => Some(window),
        Err(e) => {
            log::warn!("Header read failed for '{}': {}", blob.file_name(), e);
            None
        }
    }
}

/// Probe the container with symphonia and read the track's reported
/// duration. This is the "hand it to the platform" path: the whole blob is
/// loaded, which is why large files avoid it.
async fn probe_duration(blob: Arc<dyn AudioBlob>) -> DurationEstimate {
    let file_name = blob.file_name().to_string();
    let result = tokio::task::spawn_blocking(move || {
        let bytes = blob.read_range(0, blob.len())?;
        Ok::<_, crate::error::AppError>(probe_bytes(bytes, blob.extension().as_deref()))
    })
    .await;

    match result {
        Ok(Ok(Some(minutes))) => DurationEstimate::measured(minutes),
        Ok(Ok(None)) => DurationEstimate::unavailable(),
        Ok(Err(e)) => {
            log::warn!("Probe read failed for '{}': {}", file_name, e);
            DurationEstimate::unavailable()
        }
        Err(e) => {
            log::warn!("Probe task failed for '{}': {}", file_name, e);
            DurationEstimate::unavailable()
        }
    }
}

/// Duration from a fully-loaded blob: symphonia probe first, then the
/// header parsers when the probe comes up empty.
///
/// The probe reports no frame count for some real-world containers (a raw
/// CBR MP3 with no Xing/Info header is the usual case), so an empty probe
/// result is not the end of the line: the same header parsing used for
/// large files runs on the head of the buffer.
fn probe_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Option<f64> {
    let total_bytes = bytes.len() as u64;
    let head_len = bytes.len().min(mp3::SCAN_WINDOW_BYTES as usize);
    let head = bytes[..head_len].to_vec();

    if let Some(minutes) = probe_container(bytes, extension) {
        return Some(minutes);
    }
    parse_header_window(&head, extension, total_bytes)
}

fn probe_container(bytes: Vec<u8>, extension: Option<&str>) -> Option<f64> {
    let mss = MediaSourceStream::new(Box::new(std::io::Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)?;

    let time_base = track.codec_params.time_base?;
    let n_frames = track.codec_params.n_frames?;
    let time = time_base.calc_time(n_frames);
    let seconds = time.seconds as f64 + time.frac;
    Some(seconds / 60.0)
}

/// Route a head-of-file window to the parser for the declared extension.
/// Shared by the large-file path and the probe fallback.
fn parse_header_window(window: &[u8], extension: Option<&str>, total_bytes: u64) -> Option<f64> {
    match extension {
        Some("mp3") => mp3::parse_duration_minutes(window, total_bytes),
        Some("m4a") | Some("mp4") => {
            let end = window.len().min(mp4::SCAN_WINDOW_BYTES as usize);
            mp4::parse_duration_minutes(&window[..end])
        }
        Some("wav") => {
            let end = window.len().min(wav::HEADER_BYTES as usize);
            wav::parse_duration_minutes(&window[..end], total_bytes)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blob::MemoryBlob;

    /// Policy with a tiny tier threshold so tests exercise the header
    /// parsers without multi-megabyte fixtures.
    fn header_tier_policy() -> UploadPolicy {
        UploadPolicy {
            header_parse_threshold_bytes: 1024,
            ..UploadPolicy::default()
        }
    }

    fn blob(name: &str, bytes: Vec<u8>) -> Arc<dyn AudioBlob> {
        Arc::new(MemoryBlob::new(name, bytes))
    }

    #[tokio::test]
    async fn test_empty_blob_is_unavailable_not_error() {
        let policy = UploadPolicy::default();
        let estimate = extract_duration_minutes(blob("empty.mp3", vec![]), &policy).await;
        assert!(!estimate.is_measured());
    }

    #[tokio::test]
    async fn test_garbage_blob_is_unavailable_not_error() {
        let policy = UploadPolicy::default();
        let junk: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
        let estimate = extract_duration_minutes(blob("junk.mp3", junk), &policy).await;
        assert!(!estimate.is_measured());
    }

    #[tokio::test]
    async fn test_large_tier_garbage_is_unavailable_for_each_format() {
        let policy = header_tier_policy();
        for name in ["x.mp3", "x.m4a", "x.mp4", "x.wav"] {
            let junk = vec![0xA5u8; 2048];
            let estimate = extract_duration_minutes(blob(name, junk), &policy).await;
            assert!(!estimate.is_measured(), "format {} should degrade", name);
        }
    }

    #[tokio::test]
    async fn test_large_tier_wav_uses_byte_rate() {
        let policy = header_tier_policy();
        let mut bytes = Vec::new();
        bytes.extend(b"RIFF");
        bytes.extend(36u32.to_le_bytes());
        bytes.extend(b"WAVE");
        bytes.extend(b"fmt ");
        bytes.extend(16u32.to_le_bytes());
        bytes.extend(1u16.to_le_bytes());
        bytes.extend(1u16.to_le_bytes());
        bytes.extend(16_000u32.to_le_bytes());
        bytes.extend(32_000u32.to_le_bytes()); // byte rate
        bytes.extend(2u16.to_le_bytes());
        bytes.extend(16u16.to_le_bytes());
        bytes.extend(b"data");
        bytes.extend(0u32.to_le_bytes());
        bytes.resize(192_000, 0); // 6 seconds at 32 kB/s

        let estimate = extract_duration_minutes(blob("long.wav", bytes), &policy).await;
        assert!(estimate.is_measured());
        assert!((estimate.minutes - 0.1).abs() < 1e-9, "got {}", estimate.minutes);
    }

    #[tokio::test]
    async fn test_large_tier_mp3_cbr_estimate() {
        let policy = header_tier_policy();
        let mut bytes = vec![0xFF, 0xFB, 0x90, 0x00]; // 128 kbps
        bytes.resize(960_000, 0);
        let estimate = extract_duration_minutes(blob("talk.mp3", bytes), &policy).await;
        assert!(estimate.is_measured());
        assert!((estimate.minutes - 1.0).abs() < 1e-6, "got {}", estimate.minutes);
    }

    #[tokio::test]
    async fn test_large_tier_m4a_mvhd() {
        let policy = header_tier_policy();
        let mut bytes = vec![0u8; 64];
        bytes.extend(b"mvhd");
        bytes.push(0);
        bytes.extend([0u8; 3]);
        bytes.extend([0u8; 8]);
        bytes.extend(1000u32.to_be_bytes());
        bytes.extend(720_000u32.to_be_bytes()); // 12 minutes
        bytes.resize(4096, 0);
        let estimate = extract_duration_minutes(blob("visit.m4a", bytes), &policy).await;
        assert!(estimate.is_measured());
        assert!((estimate.minutes - 12.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_small_tier_probes_real_wav() {
        let policy = UploadPolicy::default();
        // Two seconds of 16 kHz mono, written by hound, probed in memory.
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for i in 0..32_000 {
                writer.write_sample(((i % 128) * 64) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        let estimate =
            extract_duration_minutes(blob("short.wav", cursor.into_inner()), &policy).await;
        assert!(estimate.is_measured());
        let expected = 2.0 / 60.0;
        assert!(
            (estimate.minutes - expected).abs() < 0.01,
            "got {}",
            estimate.minutes
        );
    }

    #[tokio::test]
    async fn test_small_tier_mp3_without_frame_count_is_still_measured() {
        let policy = UploadPolicy::default();
        // A bare CBR stream: one valid 128 kbps frame header, no Xing/Info
        // block. The probe has no frame count to report here, so the
        // estimate must come out of the frame-header formula instead:
        // 960_000 bytes at 128 kbps is 60 seconds.
        let mut bytes = vec![0xFF, 0xFB, 0x90, 0x00];
        bytes.resize(960_000, 0);
        let estimate = extract_duration_minutes(blob("plain.mp3", bytes), &policy).await;
        assert!(estimate.is_measured());
        assert!(
            (estimate.minutes - 1.0).abs() < 0.05,
            "got {}",
            estimate.minutes
        );
    }

    #[tokio::test]
    async fn test_unrecognized_extension_falls_back_to_probe() {
        // Above the header-parse threshold but ".ogg" has no manual
        // parser, so the probe path runs and fails on garbage.
        let policy = header_tier_policy();
        let estimate =
            extract_duration_minutes(blob("x.ogg", vec![0u8; 4096]), &policy).await;
        assert!(!estimate.is_measured());
    }
}
