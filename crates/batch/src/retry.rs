//! Retry loop for recognition calls.
//!
//! The collaborator classifies; this loop only counts attempts and sleeps.

use std::time::Duration;

use expensor_recognize::RecognitionError;

/// Final error of a call plus the number of attempts spent on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    pub error: RecognitionError,
    pub attempts: u32,
}

/// Run `call` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries are spent. Delay starts at `base_delay` and
/// doubles after each retry.
///
/// `call` receives the 1-based attempt number. `sleep` is injected so tests
/// can observe the delays without waiting.
pub fn with_retry<T>(
    max_retries: u32,
    base_delay: Duration,
    mut sleep: impl FnMut(Duration),
    mut call: impl FnMut(u32) -> Result<T, RecognitionError>,
) -> Result<T, RetryFailure> {
    let mut delay = base_delay;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match call(attempt) {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt <= max_retries => {
                log::warn!(
                    "retry {}/{} in {}ms ({})",
                    attempt,
                    max_retries,
                    delay.as_millis(),
                    error
                );
                sleep(delay);
                delay = delay.saturating_mul(2);
            }
            Err(error) => {
                return Err(RetryFailure {
                    error,
                    attempts: attempt,
                })
            }
        }
    }
}
