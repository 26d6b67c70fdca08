use std::time::Duration;

use crate::error::BatchError;

/// Externally supplied batch limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Upper bound on recognition calls in flight.
    pub max_concurrency: usize,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Retries after the first attempt, for retryable errors only.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each retry.
    pub retry_base_delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 2,
            timeout: Duration::from_secs(60),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

impl BatchOptions {
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.max_concurrency == 0 {
            return Err(BatchError::InvalidOptions(
                "max concurrency must be at least 1".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(BatchError::InvalidOptions("timeout must be positive".into()));
        }
        Ok(())
    }
}
