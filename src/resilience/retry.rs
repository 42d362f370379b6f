//! Retry policy implementation.

use std::future::Future;
use std::time::Duration;
use tracing::instrument;

use crate::errors::CoachError;

/// Default number of total attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the delay between attempts.
    pub fn backoff(mut self, delay: Duration) -> Self {
        self.backoff = delay;
        self
    }

    /// Creates a configuration that never retries.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Retry policy with a fixed backoff.
///
/// Non-retryable errors are returned immediately; retryable ones are retried
/// until `max_attempts` calls have been made, then the last error is returned
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes an operation with retries.
    ///
    /// The operation receives the zero-based attempt number.
    #[instrument(skip(self, operation), fields(max_attempts = self.config.max_attempts))]
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, CoachError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, CoachError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !err.is_retryable() || attempt + 1 >= max_attempts {
                        return Err(err);
                    }

                    tracing::info!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = u64::try_from(self.config.backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Retrying after error"
                    );

                    tokio::time::sleep(self.config.backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
