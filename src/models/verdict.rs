//! Validation and duration verdicts.
//!
//! Every outcome of the inspection pipeline is an immutable value. Rejection
//! reasons carry the measured figure and the limit it broke so the host can
//! render a precise message without re-deriving anything.

use serde::Serialize;
use thiserror::Error;

/// Why a file was rejected before any content was read.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FileRejection {
    #[error("Unsupported file type: '{extension}' is not an accepted audio format")]
    #[serde(rename_all = "camelCase")]
    UnsupportedFormat {
        extension: String,
        content_type: Option<String>,
    },

    #[error("The file is too small: {found_bytes} bytes is under the {min_bytes} byte minimum")]
    #[serde(rename_all = "camelCase")]
    TooSmall { found_bytes: u64, min_bytes: u64 },

    #[error("The file is too large: {found_bytes} bytes is over the {max_bytes} byte maximum")]
    #[serde(rename_all = "camelCase")]
    TooLarge { found_bytes: u64, max_bytes: u64 },
}

/// Outcome of format/size validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum ValidationVerdict {
    Accepted,
    Rejected { reason: FileRejection },
}

impl ValidationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationVerdict::Accepted)
    }
}

/// How much to trust a duration figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationConfidence {
    /// Read from container metadata or a decoded frame header.
    Measured,
    /// Extraction failed; the figure is meaningless and must not block.
    Unavailable,
}

/// Best-effort play duration of a blob, in minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationEstimate {
    pub minutes: f64,
    pub confidence: DurationConfidence,
}

impl DurationEstimate {
    pub fn measured(minutes: f64) -> Self {
        Self {
            minutes,
            confidence: DurationConfidence::Measured,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            minutes: 0.0,
            confidence: DurationConfidence::Unavailable,
        }
    }

    pub fn is_measured(&self) -> bool {
        self.confidence == DurationConfidence::Measured
    }
}

/// Why a measured duration was rejected.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DurationRejection {
    #[error(
        "The recording is too short: {found_minutes:.1} minutes is under the {min_minutes:.0} minute minimum"
    )]
    #[serde(rename_all = "camelCase")]
    TooShort {
        found_minutes: f64,
        min_minutes: f64,
    },

    #[error(
        "The recording is too long: {found_minutes:.1} minutes is over the {max_minutes:.0} minute maximum"
    )]
    #[serde(rename_all = "camelCase")]
    TooLong {
        found_minutes: f64,
        max_minutes: f64,
    },
}

/// Outcome of the duration policy check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum DurationVerdict {
    Accepted,
    Rejected { reason: DurationRejection },
    /// Duration could not be measured. Soft outcome: the host shows a
    /// warning but the upload is still permitted.
    Unverified,
}

impl DurationVerdict {
    /// True for `Accepted` and `Unverified`; only a hard rejection blocks.
    pub fn allows_transfer(&self) -> bool {
        !matches!(self, DurationVerdict::Rejected { .. })
    }
}
