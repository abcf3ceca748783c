use std::thread;
use std::time::Duration;

use tracing::debug;

use super::ModelError;

/// Retries an operation with the given backoff schedule.
///
/// The operation runs once, then once more after each delay in `delays`.
/// Only transient errors (network failures, timeouts, HTTP 5xx) are retried;
/// any other error is returned immediately.
///
/// # Returns
///
/// The first successful result, or the last error once the schedule is exhausted.
pub fn retry_with_backoff<F, T>(delays: &[Duration], mut f: F) -> Result<T, ModelError>
where
    F: FnMut() -> Result<T, ModelError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) if !e.is_transient() => return Err(e),
        Err(e) => e,
    };

    for (attempt, delay) in delays.iter().enumerate() {
        debug!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            error = %last_error,
            "retrying model call"
        );
        thread::sleep(*delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}
