//! Transfer collaborator abstraction.
//!
//! This module defines the `TransferApi` trait, which is the sole interface
//! for moving a selected blob to the backend. All network requests MUST be
//! implemented within the `api/` directory; the `services/` layer drives
//! uploads through this trait and never constructs HTTP requests directly.
//!
//! This keeps the transfer replaceable: hosts with a different backend (or
//! tests with no backend at all) supply their own implementation and the
//! lifecycle controller does not change.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::AppError;
use crate::models::blob::AudioBlob;
use crate::models::upload::UploadTarget;
use crate::services::progress::ProgressTracker;

/// Everything a transfer implementation needs for one attempt.
pub struct TransferRequest {
    pub blob: Arc<dyn AudioBlob>,
    pub target: UploadTarget,
    /// Attempt identifier (UUID v4 hex), stable across internal retries of
    /// the same attempt.
    pub attempt_id: String,
}

/// Terminal result of a transfer attempt that did not fail.
///
/// Cancellation is deliberately NOT an error: the controller routes it back
/// to the file-selected state with no error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    Cancelled,
}

/// Abstraction trait for the upload transfer.
///
/// Implementations report progress by calling `progress.record` with
/// absolute sent-byte counts, and must observe `cancel` cooperatively:
/// the controller only requests cancellation, it never force-terminates
/// the transfer.
pub trait TransferApi: Send + Sync {
    fn upload_audio(
        &self,
        request: TransferRequest,
        progress: Arc<ProgressTracker>,
        cancel: Arc<AtomicBool>,
    ) -> impl std::future::Future<Output = std::result::Result<TransferOutcome, AppError>> + Send;
}

pub mod v1;
