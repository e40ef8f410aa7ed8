//! SessionApiV1 — concrete implementation of the TransferApi trait for the
//! practice backend.
//!
//! Streams the selected blob as a multipart upload, reading it in fixed
//! windows so progress can be relayed and cancellation observed between
//! reads. Transient failures (network, 5xx) are retried per the configured
//! retry policy; a user cancel is resolved as a cancelled outcome, never an
//! error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{TransferApi, TransferOutcome, TransferRequest};
use crate::error::AppError;
use crate::models::blob::read_range_async;
use crate::services::progress::ProgressTracker;
use crate::services::retry::{self, RetryPolicy};

const USER_AGENT: &str = "SessionAudioUploader/0.1.0";
/// Read window for streaming the blob into the request body: 1 MiB.
const IO_CHUNK_SIZE: u64 = 1_048_576;
/// Whole-request timeout. Generous because the body is the entire file.
const UPLOAD_TIMEOUT_SECS: u64 = 300;

pub struct SessionApiV1 {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl SessionApiV1 {
    pub fn new(base_url: impl Into<String>) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upload endpoint for a session's audio recording.
    /// Separated as pub(crate) for unit testing without network.
    pub(crate) fn upload_url(&self, session_id: &str) -> String {
        format!("{}/sessions/{}/recordings", self.base_url, session_id)
    }

    /// One transfer attempt: stream the blob body, then check the response.
    async fn upload_once(
        &self,
        request: &TransferRequest,
        progress: Arc<ProgressTracker>,
        cancel: Arc<AtomicBool>,
    ) -> crate::error::Result<TransferOutcome> {
        let blob = request.blob.clone();
        let total = blob.len();

        let stream_progress = progress.clone();
        let stream_cancel = cancel.clone();
        let stream = futures::stream::unfold(0u64, move |offset| {
            let blob = blob.clone();
            let progress = stream_progress.clone();
            let cancel = stream_cancel.clone();
            async move {
                if offset >= total {
                    return None;
                }
                if cancel.load(Ordering::Relaxed) {
                    let err = std::io::Error::new(
                        std::io::ErrorKind::Interrupted,
                        "upload cancelled by user",
                    );
                    return Some((Err(err), total));
                }
                let size = IO_CHUNK_SIZE.min(total - offset);
                match read_range_async(blob, offset, size).await {
                    Ok(data) if data.is_empty() => None, // blob shrank underneath us
                    Ok(data) => {
                        let next = offset + data.len() as u64;
                        progress.record(next);
                        Some((Ok(data), next))
                    }
                    Err(e) => {
                        let err = std::io::Error::other(e.to_string());
                        Some((Err(err), total))
                    }
                }
            }
        });

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            total,
        )
        .file_name(request.blob.file_name().to_string())
        .mime_str(
            request
                .blob
                .content_type()
                .unwrap_or("application/octet-stream"),
        )
        .map_err(|e| AppError::Internal(format!("MIME parse error: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("sessionId", request.target.session_id.clone())
            .text("attemptId", request.attempt_id.clone())
            .part("audio", part);

        let url = self.upload_url(&request.target.session_id);
        let resp = match self.client.post(&url).multipart(form).send().await {
            Ok(resp) => resp,
            Err(e) => {
                // The body stream aborts the request when the cancel flag is
                // raised; distinguish that from a genuine transport failure.
                if cancel.load(Ordering::Relaxed) {
                    return Ok(TransferOutcome::Cancelled);
                }
                return Err(e.into());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Api(format!(
                "audio upload failed: status={}",
                status
            )));
        }

        progress.record(total);
        Ok(TransferOutcome::Completed)
    }
}

impl TransferApi for SessionApiV1 {
    async fn upload_audio(
        &self,
        request: TransferRequest,
        progress: Arc<ProgressTracker>,
        cancel: Arc<AtomicBool>,
    ) -> crate::error::Result<TransferOutcome> {
        retry::retry_transfer(&self.retry, &cancel, || {
            self.upload_once(&request, progress.clone(), cancel.clone())
        })
        .await
    }
}

/// Lightweight connectivity check against the backend.
///
/// Sends an HTTP HEAD request with a 5-second timeout. Returns `true` if
/// the server responds (any HTTP status), `false` if the request fails
/// (network error, timeout, DNS failure). This is NOT an error condition —
/// offline is a normal application state the host greys the control out for.
pub async fn check_connectivity(base_url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    client.head(base_url).send().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::blob::{AudioBlob, MemoryBlob};
    use crate::models::upload::UploadTarget;

    #[test]
    fn test_new_creates_instance_successfully() {
        let result = SessionApiV1::new("https://api.example.test");
        assert!(result.is_ok(), "SessionApiV1::new() should succeed");
    }

    #[test]
    fn test_upload_url_joins_session_path() {
        let api = SessionApiV1::new("https://api.example.test").unwrap();
        assert_eq!(
            api.upload_url("sess-42"),
            "https://api.example.test/sessions/sess-42/recordings"
        );
    }

    #[test]
    fn test_upload_url_strips_trailing_slash() {
        let api = SessionApiV1::new("https://api.example.test/").unwrap();
        assert_eq!(
            api.upload_url("s1"),
            "https://api.example.test/sessions/s1/recordings"
        );
    }

    #[test]
    fn test_transfer_request_construction() {
        let blob: Arc<dyn AudioBlob> = Arc::new(MemoryBlob::new("visit.mp3", vec![0u8; 64]));
        let request = TransferRequest {
            blob,
            target: UploadTarget::new("sess-7"),
            attempt_id: "a".repeat(32),
        };
        assert_eq!(request.blob.file_name(), "visit.mp3");
        assert_eq!(request.target.session_id, "sess-7");
        assert_eq!(request.attempt_id.len(), 32);
    }

    #[tokio::test]
    async fn test_pre_cancelled_upload_resolves_cancelled_without_network() {
        let api = SessionApiV1::new("https://api.example.test").unwrap();
        let blob: Arc<dyn AudioBlob> = Arc::new(MemoryBlob::new("visit.mp3", vec![0u8; 64]));
        let request = TransferRequest {
            blob,
            target: UploadTarget::new("sess-7"),
            attempt_id: uuid::Uuid::new_v4().simple().to_string(),
        };
        let progress = Arc::new(ProgressTracker::new(64));
        let cancel = Arc::new(AtomicBool::new(true));

        let outcome = api.upload_audio(request, progress, cancel).await.unwrap();
        assert_eq!(outcome, TransferOutcome::Cancelled);
    }

    #[test]
    fn test_uuid_v4_hex_is_32_chars() {
        let id = uuid::Uuid::new_v4().simple().to_string();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
