//! Client-side inspection and upload pipeline for recorded session audio.
//!
//! Hosts hand the controller a selected blob; the crate validates its
//! declared format and size, estimates play duration without decoding
//! (container header parsing for large files, a format probe for small
//! ones), enforces duration policy, and drives the transfer through an
//! injected [`api::TransferApi`] with progress, cancellation, and retry.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use api::v1::{check_connectivity, SessionApiV1};
pub use api::{TransferApi, TransferOutcome, TransferRequest};
pub use error::{AppError, Result};
pub use models::blob::{AudioBlob, FileBlob, MemoryBlob};
pub use models::policy::UploadPolicy;
pub use models::upload::{ProgressPayload, UploadEvent, UploadSnapshot, UploadState, UploadTarget};
pub use models::verdict::{
    DurationConfidence, DurationEstimate, DurationRejection, DurationVerdict, FileRejection,
    ValidationVerdict,
};
pub use services::duration::extract_duration_minutes;
pub use services::upload_engine::UploadController;
pub use services::validator::{check_duration, validate};
