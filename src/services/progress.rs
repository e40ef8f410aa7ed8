//! Progress tracking — monotonic byte counter for an in-flight transfer,
//! plus a background emitter that sends `upload:progress` events to the
//! host at 50ms intervals.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::models::upload::{ProgressPayload, UploadEvent};

/// Progress event emission interval in milliseconds.
pub const PROGRESS_EMIT_INTERVAL_MS: u64 = 50;

/// Shared byte counter for one transfer attempt.
///
/// `record` takes an absolute sent-byte count and applies it with
/// `fetch_max`, so relayed progress is monotonically non-decreasing even
/// when the transfer operation reports out of order (or restarts a request
/// internally on retry).
pub struct ProgressTracker {
    bytes_sent: AtomicU64,
    bytes_total: AtomicU64,
}

impl ProgressTracker {
    pub fn new(bytes_total: u64) -> Self {
        Self {
            bytes_sent: AtomicU64::new(0),
            bytes_total: AtomicU64::new(bytes_total),
        }
    }

    /// Record the absolute number of bytes sent so far.
    pub fn record(&self, bytes_sent: u64) {
        self.bytes_sent.fetch_max(bytes_sent, Ordering::Relaxed);
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn bytes_total(&self) -> u64 {
        self.bytes_total.load(Ordering::Relaxed)
    }

    /// Drop progress back to zero (cancellation, retry re-arm).
    pub fn reset(&self) {
        self.bytes_sent.store(0, Ordering::Relaxed);
    }
}

/// Start a background emitter that sends progress events every 50ms until
/// `stop` is set. Returns the task handle.
pub fn start_emitter(
    tracker: Arc<ProgressTracker>,
    attempt_id: String,
    events: broadcast::Sender<UploadEvent>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_millis(PROGRESS_EMIT_INTERVAL_MS)).await;
            if stop.load(Ordering::Relaxed) {
                break;
            }
            // Send errors just mean no host is listening right now.
            let _ = events.send(UploadEvent::Progress(ProgressPayload {
                attempt_id: attempt_id.clone(),
                bytes_sent: tracker.bytes_sent(),
                bytes_total: tracker.bytes_total(),
            }));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_monotonic() {
        let tracker = ProgressTracker::new(1000);
        tracker.record(400);
        tracker.record(250); // late, out-of-order report
        assert_eq!(tracker.bytes_sent(), 400);
        tracker.record(700);
        assert_eq!(tracker.bytes_sent(), 700);
    }

    #[test]
    fn test_reset_returns_to_zero() {
        let tracker = ProgressTracker::new(1000);
        tracker.record(999);
        tracker.reset();
        assert_eq!(tracker.bytes_sent(), 0);
        assert_eq!(tracker.bytes_total(), 1000);
    }

    #[test]
    fn test_concurrent_records_keep_maximum() {
        let tracker = Arc::new(ProgressTracker::new(100_000));
        let mut handles = vec![];
        for start in 0..10u64 {
            let t = tracker.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100u64 {
                    t.record(start * 100 + i);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.bytes_sent(), 999);
    }

    #[tokio::test]
    async fn test_emitter_sends_ticks_then_stops() {
        let tracker = Arc::new(ProgressTracker::new(1000));
        tracker.record(500);
        let (tx, mut rx) = broadcast::channel(64);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = start_emitter(tracker.clone(), "attempt-1".into(), tx, stop.clone());

        let event = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("emitter should tick")
            .unwrap();
        match event {
            UploadEvent::Progress(p) => {
                assert_eq!(p.attempt_id, "attempt-1");
                assert_eq!(p.bytes_sent, 500);
                assert_eq!(p.bytes_total, 1000);
            }
            other => panic!("expected progress event, got {:?}", other),
        }

        stop.store(true, Ordering::Relaxed);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("emitter should stop")
            .unwrap();
    }

    #[test]
    fn test_progress_emit_interval_constant() {
        assert_eq!(PROGRESS_EMIT_INTERVAL_MS, 50);
    }
}
