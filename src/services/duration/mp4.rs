//! MP4/M4A duration from the `mvhd` (movie header) atom.
//!
//! The atom is located by a linear scan for its 4-byte tag rather than by
//! walking the atom tree — the `moov` box sits near the front of most
//! faststart files, and files whose `moov` lands beyond the scan window
//! simply resolve to "unavailable".

use super::reader::ByteReader;

/// Bytes read from the head of the file for the atom scan.
pub const SCAN_WINDOW_BYTES: u64 = 100 * 1024;

/// Offsets are measured from the start of the `mvhd` tag itself. Version 0
/// stores 32-bit creation/modification times; version 1 widens them to
/// 64 bits, pushing timescale and duration 8 bytes further out.
const V0_TIMESCALE_OFFSET: usize = 16;
const V1_TIMESCALE_OFFSET: usize = 24;

/// Extract play duration in minutes from the scan window.
pub fn parse_duration_minutes(window: &[u8]) -> Option<f64> {
    let tag_start = find_atom_tag(window, b"mvhd")?;

    let mut r = ByteReader::at(window, tag_start + 4)?;
    let version = r.read_u8()?;
    let timescale_offset = match version {
        0 => V0_TIMESCALE_OFFSET,
        1 => V1_TIMESCALE_OFFSET,
        _ => return None,
    };

    let mut r = ByteReader::at(window, tag_start + timescale_offset)?;
    let timescale = r.read_u32_be()?;
    let duration = r.read_u32_be()?;
    if timescale == 0 {
        return None;
    }

    Some(duration as f64 / timescale as f64 / 60.0)
}

/// Position of the first occurrence of a 4-byte atom tag.
fn find_atom_tag(window: &[u8], tag: &[u8; 4]) -> Option<usize> {
    window.windows(4).position(|w| w == tag)
}
