//! Retry policy (§4.9): exponential backoff, non-retryable errors propagate
//! immediately.

use std::future::Future;
use std::time::Duration;

use pohw_core::{constants::ANCHOR_RETRY_ATTEMPTS, PohwError};

/// Substrings that mark a failure as permanent (§4.9: "insufficient",
/// "invalid", key-format errors).
const NON_RETRYABLE_MARKERS: &[&str] = &["insufficient", "invalid", "key format", "malformed key"];

pub fn is_retryable(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    !NON_RETRYABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Retry `op` up to `ANCHOR_RETRY_ATTEMPTS` times with exponential backoff
/// starting at `initial_backoff_ms`, doubling each attempt. Stops early on a
/// non-retryable error.
pub async fn retry_with_backoff<F, Fut, T>(initial_backoff_ms: u64, mut op: F) -> Result<T, PohwError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PohwError>>,
{
    let mut backoff_ms = initial_backoff_ms;
    let mut last_err = None;
    for attempt in 1..=ANCHOR_RETRY_ATTEMPTS {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let retryable = err.is_retryable() && is_retryable(&err.to_string());
                if !retryable || attempt == ANCHOR_RETRY_ATTEMPTS {
                    return Err(err);
                }
                tracing::warn!(attempt, backoff_ms, error = %err, "anchor op failed, retrying");
                last_err = Some(err);
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
            }
        }
    }
    Err(last_err.unwrap_or_else(|| PohwError::Other("retry loop exhausted with no error recorded".into())))
}
