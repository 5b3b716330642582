// Bounded exponential backoff for one-shot network calls.
//
// Wraps a single async operation and retries it on failure with
// exponentially increasing delays. Used for the notification fetch,
// account lookup, and status post paths — the streaming connection is
// never retried here (a remote close ends it by design).

use std::time::Duration;

use tracing::warn;

use crate::error::{Error, SourceError};

/// Default retry ceiling when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Base delay for exponential backoff (doubles each retry).
const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// Maximum backoff delay to cap exponential growth.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Run `operation` up to `max_attempts` times, sleeping between failures.
///
/// Returns the first successful result. After the final failed attempt,
/// returns [`Error::RetryExhausted`] carrying the last underlying failure.
/// A `max_attempts` of 0 is treated as 1 — the operation always runs once.
/// Each retry emits one warning-level log entry with the attempt number.
pub async fn invoke<T, F, Fut>(max_attempts: u32, operation: F) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SourceError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(Error::RetryExhausted {
                        attempts: max_attempts,
                        last: err,
                    });
                }

                // 500ms, 1s, 2s, ... capped at MAX_BACKOFF
                let backoff = BASE_BACKOFF
                    .saturating_mul(1u32 << (attempt - 1).min(31))
                    .min(MAX_BACKOFF);

                warn!(
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}
