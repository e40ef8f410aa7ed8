//! Format/size validation and the duration policy check.
//!
//! Both checks are pure and synchronous. `validate` reads only blob
//! metadata (name, size, declared type), never content; a rejected file
//! must not cost any I/O. Outcomes are values — nothing here returns `Err`.

use crate::models::blob::AudioBlob;
use crate::models::policy::UploadPolicy;
use crate::models::verdict::{
    DurationEstimate, DurationRejection, DurationVerdict, FileRejection, ValidationVerdict,
};

/// Check a selected blob's declared format and byte length against policy.
///
/// Format passes when EITHER the extension or the declared content type is
/// on the allow-list; requiring both would reject files from hosts that
/// report inconsistent or missing MIME types. Format is checked before
/// size, so an off-list file is always `UnsupportedFormat` regardless of
/// how large or small it is.
pub fn validate(blob: &dyn AudioBlob, policy: &UploadPolicy) -> ValidationVerdict {
    let extension = blob.extension().unwrap_or_default();
    let content_type = blob.content_type().map(|c| c.to_ascii_lowercase());

    let extension_ok = policy.allowed_extensions.iter().any(|e| *e == extension);
    let content_type_ok = content_type
        .as_deref()
        .is_some_and(|ct| policy.allowed_content_types.iter().any(|a| a == ct));

    if !extension_ok && !content_type_ok {
        return ValidationVerdict::Rejected {
            reason: FileRejection::UnsupportedFormat {
                extension,
                content_type,
            },
        };
    }

    let found_bytes = blob.len();
    if found_bytes < policy.min_file_bytes {
        return ValidationVerdict::Rejected {
            reason: FileRejection::TooSmall {
                found_bytes,
                min_bytes: policy.min_file_bytes,
            },
        };
    }
    if found_bytes > policy.max_file_bytes {
        return ValidationVerdict::Rejected {
            reason: FileRejection::TooLarge {
                found_bytes,
                max_bytes: policy.max_file_bytes,
            },
        };
    }

    ValidationVerdict::Accepted
}

/// Compare a duration estimate against the policy bounds.
///
/// An `Unavailable` estimate yields `Unverified`: the host surfaces a soft
/// warning but the upload stays permitted. Only a measured out-of-bounds
/// duration blocks.
pub fn check_duration(estimate: &DurationEstimate, policy: &UploadPolicy) -> DurationVerdict {
    if !estimate.is_measured() {
        return DurationVerdict::Unverified;
    }
    if estimate.minutes < policy.min_duration_minutes {
        return DurationVerdict::Rejected {
            reason: DurationRejection::TooShort {
                found_minutes: estimate.minutes,
                min_minutes: policy.min_duration_minutes,
            },
        };
    }
    if estimate.minutes > policy.max_duration_minutes {
        return DurationVerdict::Rejected {
            reason: DurationRejection::TooLong {
                found_minutes: estimate.minutes,
                max_minutes: policy.max_duration_minutes,
            },
        };
    }
    DurationVerdict::Accepted
}
