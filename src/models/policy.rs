//! Upload policy — every bound the host application may tune.

use serde::{Deserialize, Serialize};

/// Accepted file extensions (lower case, no dot).
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] =
    &["mp3", "wav", "m4a", "mp4", "aac", "flac", "ogg", "webm"];

/// Accepted declared content types. Matching EITHER an extension or a
/// content type is enough; hosts report inconsistent or missing MIME types.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/mp4",
    "audio/x-m4a",
    "audio/m4a",
    "audio/aac",
    "audio/flac",
    "audio/x-flac",
    "audio/ogg",
    "audio/webm",
];

/// Validation and inspection bounds, host-overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPolicy {
    /// Reject files smaller than this (filters empty/near-empty clips). 5 MiB.
    pub min_file_bytes: u64,
    /// Reject files larger than this (protects transfer and transcription). 500 MiB.
    pub max_file_bytes: u64,
    /// Reject recordings shorter than this many minutes.
    pub min_duration_minutes: f64,
    /// Reject recordings longer than this many minutes.
    pub max_duration_minutes: f64,
    /// Files at or above this size skip the decoder probe and go through
    /// manual header parsing. 50 MiB.
    pub header_parse_threshold_bytes: u64,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            min_file_bytes: 5 * 1024 * 1024,
            max_file_bytes: 500 * 1024 * 1024,
            min_duration_minutes: 5.0,
            max_duration_minutes: 90.0,
            header_parse_threshold_bytes: 50 * 1024 * 1024,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
