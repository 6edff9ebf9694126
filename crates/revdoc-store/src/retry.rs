//! Retry with exponential back-off and jitter for store operations.
//!
//! [`retry_with_backoff`] wraps any fallible async store call and retries only
//! when [`StoreError::is_retriable`] says the failure is transient.

use std::future::Future;
use std::time::Duration;

use crate::StoreError;

const MAX_DELAY_MS: u64 = 60_000;
const MAX_DOUBLINGS: u32 = 10;

/// Calls `operation` until it succeeds, fails permanently, or has been
/// retried `max_retries` times.
///
/// Retry `n` (1-based) sleeps `backoff_base_ms × 2ⁿ⁻¹`, capped at 60 s and
/// scaled by a random factor between 0.75 and 1.25.
///
/// # Errors
///
/// Returns the first error that [`StoreError::is_retriable`] rejects, or the
/// last transient error once the retry budget is spent.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retriable() && retry < max_retries => err,
            Err(err) => return Err(err),
        };
        retry += 1;
        let delay = backoff_delay(backoff_base_ms, retry, rand::random::<f64>());
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "store: transient error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Sleep before retry `retry`. `unit` is a uniform sample in `0.0..1.0`
/// that picks the jitter factor.
fn backoff_delay(base_ms: u64, retry: u32, unit: f64) -> Duration {
    let doublings = retry.saturating_sub(1).min(MAX_DOUBLINGS);
    let capped = base_ms.saturating_mul(1u64 << doublings).min(MAX_DELAY_MS);
    let factor = 0.75 + unit.clamp(0.0, 1.0) * 0.5;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let millis = (capped as f64 * factor) as u64;
    Duration::from_millis(millis)
}
