//! WAV duration from the canonical RIFF header.
//!
//! Assumes the canonical 44-byte layout: `RIFF` + size + `WAVE`, a plain
//! `fmt ` chunk, then `data`. The byte-rate field at offset 28 divides the
//! file size into seconds. Files with extra chunks ahead of `data` are
//! slightly over-estimated; non-PCM exotics that lie about byte rate are
//! out of scope.

use super::reader::ByteReader;

/// The canonical RIFF/WAVE header is exactly 44 bytes; nothing past it is
/// needed for a duration estimate.
pub const HEADER_BYTES: u64 = 44;

/// Byte offset of the little-endian `byteRate` field in the `fmt ` chunk.
const BYTE_RATE_OFFSET: usize = 28;

/// Estimate play duration in minutes from the header and total file size.
pub fn parse_duration_minutes(header: &[u8], total_bytes: u64) -> Option<f64> {
    let mut r = ByteReader::new(header);
    if r.read_bytes(4)? != b"RIFF" {
        return None;
    }
    let mut r = ByteReader::at(header, BYTE_RATE_OFFSET)?;
    let byte_rate = r.read_u32_le()?;
    if byte_rate == 0 {
        return None;
    }
    let seconds = total_bytes as f64 / byte_rate as f64;
    Some(seconds / 60.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_header(byte_rate: u32) -> Vec<u8> {
        let mut h = Vec::with_capacity(44);
        h.extend(b"RIFF");
        h.extend(36u32.to_le_bytes());
        h.extend(b"WAVE");
        h.extend(b"fmt ");
        h.extend(16u32.to_le_bytes()); // fmt chunk size
        h.extend(1u16.to_le_bytes()); // PCM
        h.extend(1u16.to_le_bytes()); // mono
        h.extend(16_000u32.to_le_bytes()); // sample rate
        h.extend(byte_rate.to_le_bytes());
        h.extend(2u16.to_le_bytes()); // block align
        h.extend(16u16.to_le_bytes()); // bits per sample
        h.extend(b"data");
        h.extend(0u32.to_le_bytes());
        h
    }

    #[test]
    fn test_duration_from_byte_rate() {
        let header = canonical_header(32_000);
        // 1_920_000 bytes at 32 kB/s = 60 s.
        let minutes = parse_duration_minutes(&header, 1_920_000).unwrap();
        assert!((minutes - 1.0).abs() < 1e-9, "got {}", minutes);
    }

    #[test]
    fn test_missing_riff_magic_yields_none() {
        let mut header = canonical_header(32_000);
        header[0] = b'X';
        assert_eq!(parse_duration_minutes(&header, 1_920_000), None);
    }

    #[test]
    fn test_zero_byte_rate_yields_none() {
        let header = canonical_header(0);
        assert_eq!(parse_duration_minutes(&header, 1_920_000), None);
    }

    #[test]
    fn test_truncated_header_yields_none() {
        let header = canonical_header(32_000);
        assert_eq!(parse_duration_minutes(&header[..20], 1_920_000), None);
    }

    #[test]
    fn test_empty_header_yields_none() {
        assert_eq!(parse_duration_minutes(&[], 1_920_000), None);
    }

    #[test]
    fn test_hound_generated_header_parses() {
        // Generate a real one-second 16 kHz mono file and check the
        // estimate against its actual size.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..16_000 {
            let sample = ((i as f32 * 0.05).sin() * 8_000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let total = bytes.len() as u64;
        let minutes = parse_duration_minutes(&bytes[..44], total).unwrap();
        // byte rate 32_000; file is samples + 44 header bytes, so the
        // estimate lands just over one second.
        let expected = total as f64 / 32_000.0 / 60.0;
        assert!((minutes - expected).abs() < 1e-9);
        assert!(minutes > 1.0 / 60.0);
        assert!(minutes < 1.1 / 60.0);
    }
}
