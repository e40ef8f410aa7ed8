//! MP3 duration from the first MPEG frame header.
//!
//! Strategy: skip a leading ID3v2 tag (its size field is a 28-bit synchsafe
//! integer), scan forward for a frame sync, decode the bitrate from the
//! header, and estimate duration as `file_bytes * 8 / bitrate`. Exact for
//! constant-bitrate files; variable-bitrate files come out with some error,
//! which the caller accepts as a known limitation.
//!
//! Only MPEG version 1, Layer III headers are decoded. Anything else
//! resolves to `None` — this is not a general MPEG parser.

use super::reader::ByteReader;

/// Bytes read from the head of the file for the frame scan.
pub const SCAN_WINDOW_BYTES: u64 = 128 * 1024;

/// MPEG-1 Layer III bitrates in kbps, indexed by the header's
/// bitrate-index nibble. Index 0 is "free" and 15 is invalid.
const BITRATE_KBPS: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];

/// MPEG-1 sample rates in Hz. Index 3 is reserved.
const SAMPLE_RATE_HZ: [u32; 4] = [44_100, 48_000, 32_000, 0];

/// Estimate play duration in minutes from the scan window and total size.
///
/// `window` holds the first bytes of the file (up to [`SCAN_WINDOW_BYTES`]);
/// `total_bytes` is the full file length used by the CBR formula.
pub fn parse_duration_minutes(window: &[u8], total_bytes: u64) -> Option<f64> {
    let start = frame_area_offset(window);
    let sync = find_frame_sync(window, start)?;
    let bitrate_kbps = decode_frame_bitrate(window, sync)?;
    let seconds = (total_bytes as f64 * 8.0) / (bitrate_kbps as f64 * 1000.0);
    Some(seconds / 60.0)
}

/// Offset of the first byte past any leading ID3v2 tag.
///
/// The tag size field at bytes 6..10 is synchsafe: 7 payload bits per byte,
/// top bit of each byte ignored. The declared size excludes the 10-byte
/// tag header itself.
fn frame_area_offset(window: &[u8]) -> usize {
    let mut r = ByteReader::new(window);
    let magic = match r.read_bytes(3) {
        Some(m) => m,
        None => return 0,
    };
    if magic != b"ID3" {
        return 0;
    }
    // version (2) + flags (1)
    if r.skip(3).is_none() {
        return 0;
    }
    let mut size: usize = 0;
    for _ in 0..4 {
        let b = match r.read_u8() {
            Some(b) => b,
            None => return 0,
        };
        size = (size << 7) | (b & 0x7F) as usize;
    }
    size + 10
}

/// Byte-by-byte scan for an MPEG frame sync: `0xFF` followed by a byte
/// whose top three bits are all set.
fn find_frame_sync(window: &[u8], start: usize) -> Option<usize> {
    if start >= window.len() {
        return None;
    }
    (start..window.len().checked_sub(1)?)
        .find(|&i| window[i] == 0xFF && window[i + 1] & 0xE0 == 0xE0)
}

/// Decode the bitrate in kbps from the frame header at `sync`.
///
/// The first sync hit decides: if its header is not MPEG-1 Layer III, or
/// its bitrate/sample-rate indices are invalid, the whole estimate is
/// abandoned rather than scanning for a friendlier frame.
fn decode_frame_bitrate(window: &[u8], sync: usize) -> Option<u32> {
    let mut r = ByteReader::at(window, sync)?;
    let header = r.read_bytes(4)?;

    let version_bits = (header[1] >> 3) & 0x03;
    let layer_bits = (header[1] >> 1) & 0x03;
    if version_bits != 0b11 || layer_bits != 0b01 {
        // Not MPEG-1 Layer III.
        return None;
    }

    let bitrate_index = (header[2] >> 4) as usize;
    let sample_rate_index = ((header[2] >> 2) & 0x03) as usize;

    let bitrate_kbps = BITRATE_KBPS[bitrate_index];
    if bitrate_kbps == 0 {
        return None;
    }
    if SAMPLE_RATE_HZ[sample_rate_index] == 0 {
        return None;
    }
    Some(bitrate_kbps)
}
