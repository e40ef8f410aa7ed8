//! Upload engine — the lifecycle state machine for one user-facing upload
//! control: select → validate → duration check → transfer, with
//! cancellation, retry, and stale-result suppression.
//!
//! All transitions are serialized behind one mutex; background work
//! (duration extraction, the transfer itself) re-enters through that mutex
//! and is matched against the current selection generation before it may
//! touch state. A result for a superseded selection is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, Mutex};

use crate::api::{TransferApi, TransferOutcome, TransferRequest};
use crate::error::AppError;
use crate::models::blob::AudioBlob;
use crate::models::policy::UploadPolicy;
use crate::models::upload::{UploadEvent, UploadSnapshot, UploadState, UploadTarget};
use crate::models::verdict::{DurationVerdict, ValidationVerdict};
use crate::services::{duration, progress, validator};
use crate::services::progress::ProgressTracker;

/// Capacity of the host-facing event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct Selection {
    blob: Arc<dyn AudioBlob>,
    validation: ValidationVerdict,
    /// `None` while extraction is still running (or was never started
    /// because validation rejected the file).
    duration: Option<DurationVerdict>,
}

struct Inner {
    state: UploadState,
    selection: Option<Selection>,
    /// Bumped on every select/remove; async results carry the generation
    /// they were started under and are dropped on mismatch.
    generation: u64,
    consent_given: bool,
    attempt_id: Option<String>,
    cancel_flag: Option<Arc<AtomicBool>>,
    tracker: Arc<ProgressTracker>,
    error_message: Option<String>,
}

impl Inner {
    fn snapshot(&self) -> UploadSnapshot {
        UploadSnapshot {
            state: self.state,
            file_name: self
                .selection
                .as_ref()
                .map(|s| s.blob.file_name().to_string()),
            bytes_sent: self.tracker.bytes_sent(),
            bytes_total: self.tracker.bytes_total(),
            validation: self.selection.as_ref().map(|s| s.validation.clone()),
            duration: self.selection.as_ref().and_then(|s| s.duration.clone()),
            error_message: self.error_message.clone(),
        }
    }

    /// Whether start_transfer is currently permitted.
    fn transfer_armed(&self) -> bool {
        if self.state != UploadState::FileSelected || !self.consent_given {
            return false;
        }
        match &self.selection {
            Some(sel) => {
                sel.validation.is_accepted()
                    && sel
                        .duration
                        .as_ref()
                        .is_some_and(|d| d.allows_transfer())
            }
            None => false,
        }
    }
}

/// Single-consumer upload lifecycle controller.
///
/// One controller per upload control in the host UI; at most one transfer
/// is in flight per controller. All methods are no-ops (logged at warn)
/// when called in a state that does not permit them: the host is expected
/// to have disabled the affordance, so a stray call is not worth a panic.
pub struct UploadController<A: TransferApi + 'static> {
    api: Arc<A>,
    policy: Arc<UploadPolicy>,
    events: broadcast::Sender<UploadEvent>,
    inner: Arc<Mutex<Inner>>,
}

impl<A: TransferApi + 'static> UploadController<A> {
    pub fn new(api: Arc<A>, policy: UploadPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            api,
            policy: Arc::new(policy),
            events,
            inner: Arc::new(Mutex::new(Inner {
                state: UploadState::Idle,
                selection: None,
                generation: 0,
                consent_given: false,
                attempt_id: None,
                cancel_flag: None,
                tracker: Arc::new(ProgressTracker::new(0)),
                error_message: None,
            })),
        }
    }

    /// Subscribe to state and progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Current snapshot, for pull-based hosts.
    pub async fn snapshot(&self) -> UploadSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// Record whether the consent acknowledgement has been given. Transfer
    /// cannot start without it.
    pub async fn set_consent(&self, given: bool) {
        self.inner.lock().await.consent_given = given;
    }

    /// Select a file for upload.
    ///
    /// Validation runs synchronously; a rejected file stays selected (so
    /// the host can show it alongside the reason) but the transfer stays
    /// disabled and no duration work is started. An accepted file kicks off
    /// duration extraction in the background.
    pub async fn select(&self, blob: Arc<dyn AudioBlob>) {
        let generation;
        {
            let mut g = self.inner.lock().await;
            match g.state {
                UploadState::Idle | UploadState::FileSelected => {}
                other => {
                    log::warn!("select() ignored in state {:?}", other);
                    return;
                }
            }
            g.generation += 1;
            generation = g.generation;
            let validation = validator::validate(blob.as_ref(), &self.policy);
            if let ValidationVerdict::Rejected { reason } = &validation {
                log::debug!("File '{}' rejected: {}", blob.file_name(), reason);
            }
            g.selection = Some(Selection {
                blob: blob.clone(),
                validation: validation.clone(),
                duration: None,
            });
            g.state = UploadState::FileSelected;
            g.error_message = None;
            g.attempt_id = None;
            g.cancel_flag = None;
            g.tracker = Arc::new(ProgressTracker::new(blob.len()));
            self.emit_state(&g);

            if !validation.is_accepted() {
                // Fail fast: no duration I/O on a file already known bad.
                return;
            }
        }

        let inner = self.inner.clone();
        let events = self.events.clone();
        let policy = self.policy.clone();
        tokio::spawn(async move {
            let estimate = duration::extract_duration_minutes(blob, &policy).await;
            let verdict = validator::check_duration(&estimate, &policy);

            let mut g = inner.lock().await;
            if g.generation != generation {
                log::debug!("Discarding duration result for a superseded selection");
                return;
            }
            if let Some(sel) = g.selection.as_mut() {
                sel.duration = Some(verdict);
            }
            let _ = events.send(UploadEvent::State(g.snapshot()));
        });
    }

    /// Discard the current selection.
    pub async fn remove_file(&self) {
        let mut g = self.inner.lock().await;
        if g.state != UploadState::FileSelected {
            log::warn!("remove_file() ignored in state {:?}", g.state);
            return;
        }
        g.generation += 1;
        g.selection = None;
        g.state = UploadState::Idle;
        g.error_message = None;
        g.attempt_id = None;
        g.cancel_flag = None;
        g.tracker = Arc::new(ProgressTracker::new(0));
        self.emit_state(&g);
    }

    /// Begin transferring the selected file.
    ///
    /// No-op unless a validated file is armed and consent was given.
    pub async fn start_transfer(&self, target: UploadTarget) {
        let (blob, tracker, cancel_flag, attempt_id, generation);
        {
            let mut g = self.inner.lock().await;
            if !g.transfer_armed() {
                log::warn!(
                    "start_transfer() ignored: state={:?}, armed=false",
                    g.state
                );
                return;
            }
            let Some(sel) = g.selection.as_ref() else {
                return;
            };
            blob = sel.blob.clone();
            generation = g.generation;
            attempt_id = uuid::Uuid::new_v4().simple().to_string();
            cancel_flag = Arc::new(AtomicBool::new(false));
            tracker = Arc::new(ProgressTracker::new(blob.len()));
            g.attempt_id = Some(attempt_id.clone());
            g.cancel_flag = Some(cancel_flag.clone());
            g.tracker = tracker.clone();
            g.state = UploadState::Uploading;
            self.emit_state(&g);
        }

        let emitter_stop = Arc::new(AtomicBool::new(false));
        progress::start_emitter(
            tracker.clone(),
            attempt_id.clone(),
            self.events.clone(),
            emitter_stop.clone(),
        );

        let api = self.api.clone();
        let inner = self.inner.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let request = TransferRequest {
                blob,
                target,
                attempt_id,
            };
            let upload = api.upload_audio(request, tracker.clone(), cancel_flag.clone());
            // A panicking collaborator must not strand the controller in
            // Uploading; treat it as a failed transfer.
            let result = match std::panic::AssertUnwindSafe(upload).catch_unwind().await {
                Ok(result) => result,
                Err(_) => Err(AppError::Internal("transfer failed unexpectedly".into())),
            };
            emitter_stop.store(true, Ordering::Relaxed);

            let mut g = inner.lock().await;
            if g.generation != generation {
                log::debug!("Discarding transfer result for a superseded selection");
                return;
            }
            match result {
                Ok(TransferOutcome::Completed) => {
                    g.tracker.record(g.tracker.bytes_total());
                    g.state = UploadState::Success;
                }
                Ok(TransferOutcome::Cancelled) => {
                    g.tracker.reset();
                    g.state = UploadState::FileSelected;
                }
                Err(e) => {
                    log::error!("Upload failed: {}", e);
                    g.tracker.reset();
                    g.state = UploadState::Error;
                    g.error_message = Some(e.to_string());
                }
            }
            g.attempt_id = None;
            g.cancel_flag = None;
            let _ = events.send(UploadEvent::State(g.snapshot()));
        });
    }

    /// Request cancellation of the in-flight transfer.
    ///
    /// Cooperative: this only raises the cancel flag; the state moves back
    /// to `FileSelected` when the transfer operation resolves cancelled.
    pub async fn cancel(&self) {
        let g = self.inner.lock().await;
        if g.state != UploadState::Uploading {
            log::warn!("cancel() ignored in state {:?}", g.state);
            return;
        }
        if let Some(flag) = &g.cancel_flag {
            flag.store(true, Ordering::Relaxed);
            log::debug!("Cancel requested for in-flight upload");
        }
    }

    /// Re-arm the selected file after a failed transfer.
    ///
    /// Validation and duration results are kept as-is: only the transfer
    /// failed, the file itself is unchanged.
    pub async fn retry(&self) {
        let mut g = self.inner.lock().await;
        if g.state != UploadState::Error {
            log::warn!("retry() ignored in state {:?}", g.state);
            return;
        }
        g.state = UploadState::FileSelected;
        g.error_message = None;
        g.tracker.reset();
        self.emit_state(&g);
    }

    /// Dismiss a terminal screen, returning the controller to idle.
    pub async fn dismiss(&self) {
        let mut g = self.inner.lock().await;
        match g.state {
            UploadState::Success | UploadState::Error => {}
            other => {
                log::warn!("dismiss() ignored in state {:?}", other);
                return;
            }
        }
        g.generation += 1;
        g.selection = None;
        g.state = UploadState::Idle;
        g.error_message = None;
        g.attempt_id = None;
        g.cancel_flag = None;
        g.tracker = Arc::new(ProgressTracker::new(0));
        self.emit_state(&g);
    }

    fn emit_state(&self, g: &Inner) {
        let _ = self.events.send(UploadEvent::State(g.snapshot()));
    }
}
