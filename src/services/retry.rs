//! Retry policy — exponential backoff with jitter for transient transfer
//! failures.
//!
//! This is the transfer collaborator's own policy: the lifecycle controller
//! never retries anything on its own, and validation outcomes are never
//! routed through here. Cancellation is observed before every attempt and
//! resolves as a cancelled outcome, not an error.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::TransferOutcome;
use crate::error::AppError;

/// Default initial backoff delay in milliseconds.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
/// Default maximum backoff delay in milliseconds (30 seconds).
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Default attempt cap. Bounded because there is no interactive surface
/// for endless-retry warnings; the controller's error state handles the
/// give-up instead.
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: DEFAULT_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Check whether an error is retryable.
///
/// Network errors are always retryable. API errors are retryable only for
/// 5xx server errors. All other errors (Io, Internal) are not.
pub fn is_retryable(err: &AppError) -> bool {
    match err {
        AppError::Network(_) => true,
        AppError::Api(msg) => {
            msg.contains("status=5")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("504")
        }
        AppError::Io(_) | AppError::Internal(_) => false,
    }
}

/// Calculate exponential backoff delay with +/-10% jitter.
pub fn calculate_delay(attempt: u32, policy: &RetryPolicy) -> u64 {
    let base = policy
        .initial_delay_ms
        .saturating_mul(1u64 << attempt.min(31));
    let capped = base.min(policy.max_delay_ms);
    let jitter_range = capped / 10;
    if jitter_range == 0 {
        return capped;
    }
    // Simple deterministic-ish jitter using attempt as seed
    let jitter = (attempt as u64 * 7 + 13) % (jitter_range * 2 + 1);
    capped - jitter_range + jitter
}

/// Run a transfer attempt with automatic retry on transient errors.
///
/// A cancelled outcome from the operation, or a cancel flag observed
/// between attempts, short-circuits without further retries.
pub async fn retry_transfer<F, Fut>(
    policy: &RetryPolicy,
    cancel_flag: &Arc<AtomicBool>,
    mut operation: F,
) -> crate::error::Result<TransferOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::error::Result<TransferOutcome>>,
{
    let mut attempt: u32 = 0;

    loop {
        if cancel_flag.load(Ordering::Relaxed) {
            return Ok(TransferOutcome::Cancelled);
        }

        match operation().await {
            Ok(outcome) => return Ok(outcome),
            Err(err) => {
                if !is_retryable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }

                log::warn!(
                    "Transfer retry: attempt={}, error={}",
                    attempt,
                    err
                );

                let delay = calculate_delay(attempt, policy);
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;

                attempt = attempt.saturating_add(1);
            }
        }
    }
}
