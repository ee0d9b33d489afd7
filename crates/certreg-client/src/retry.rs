//! Backoff for registry HTTP calls.
//!
//! A request is repeated only when no response came back at all. Any
//! status, error or not, goes to the caller to decode.

use std::time::Duration;

/// Retry attempts after the initial request.
pub(crate) const MAX_RETRIES: u32 = 3;

/// First backoff delay; doubles each attempt (200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Send with backoff. `f` is called up to `MAX_RETRIES + 1` times.
///
/// Submissions are safe to repeat: `f` re-sends one already-signed
/// transaction, and the registry keys its commit by that transaction's id,
/// so a repeat that lands after an unseen commit gets the first record back.
pub(crate) async fn retry_send<F, Fut>(
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..MAX_RETRIES {
        let err = match f().await {
            Ok(resp) => return Ok(resp),
            Err(err) => err,
        };
        let delay = backoff(attempt);
        tracing::warn!(
            endpoint,
            attempt = attempt + 1,
            max_retries = MAX_RETRIES,
            error = %err,
            "no response from registry, retrying in {delay:?}"
        );
        tokio::time::sleep(delay).await;
    }
    f().await
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << attempt)
}
