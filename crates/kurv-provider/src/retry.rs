//! Retry with exponential backoff for transient provider errors.
//!
//! Rate-limit failures back off substantially longer than generic transport
//! failures, and every delay carries jitter so concurrent optimizations do
//! not retry in lockstep.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ProviderError;

/// Rate-limit backoff uses this multiple of the generic base when the server
/// did not send a usable `Retry-After`.
const RATE_LIMIT_BASE_MULTIPLIER: u64 = 4;

/// Returns `true` if `err` represents a transient condition worth retrying.
///
/// Retriable: rate limiting, network-level failures, and 5xx statuses.
/// Everything else (404, other 4xx, decode errors) is propagated immediately.
fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::RateLimited { .. } | ProviderError::Http(_) => true,
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Backoff before the next attempt, given the error that caused the retry.
fn backoff_delay(err: &ProviderError, backoff_base_ms: u64, attempt: u32) -> Duration {
    let shift = attempt.min(16);
    let base_ms = match err {
        ProviderError::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
            retry_after_secs.saturating_mul(1000)
        }
        ProviderError::RateLimited { .. } => backoff_base_ms
            .saturating_mul(RATE_LIMIT_BASE_MULTIPLIER)
            .saturating_mul(1u64 << shift),
        _ => backoff_base_ms.saturating_mul(1u64 << shift),
    };
    let jitter_ms = if backoff_base_ms == 0 {
        0
    } else {
        rand::rng().random_range(0..=backoff_base_ms / 2)
    };
    Duration::from_millis(base_ms.saturating_add(jitter_ms))
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps and tries again, up to
/// `max_retries` additional attempts after the first try; the last error is
/// returned when retries are exhausted. Non-retriable errors return
/// immediately without sleeping.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay = backoff_delay(&err, backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient provider error — retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
