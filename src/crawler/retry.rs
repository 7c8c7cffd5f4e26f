//! Retry strategy for transient fetch failures
//!
//! Retry control flow is value-driven: every fetch attempt is classified
//! into an [`AttemptOutcome`] and an imperative loop in the pipeline
//! consumes it. Errors never unwind through the retry loop.

use std::time::Duration;

use crate::backend::FetchResponse;
use crate::BackendError;

/// Exponential backoff policy with a cap
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    /// Total attempts allowed, including the first
    pub max_retries: u32,

    /// Delay before the second attempt
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl RetryStrategy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> RetryStrategy {
        RetryStrategy {
            max_retries: max_retries.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Backoff delay after the given 1-based attempt number
    ///
    /// Doubles per attempt: `base`, `2*base`, `4*base`, ... capped at
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::new(3, Duration::from_millis(500), Duration::from_secs(30))
    }
}

/// Classified result of one fetch attempt
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 2xx response with content
    Success(FetchResponse),

    /// Worth retrying: timeout, connection error, IO error
    Transient(BackendError),

    /// Not worth retrying: explicit HTTP error status or backend rejection
    Permanent(BackendError),
}

impl AttemptOutcome {
    /// Classifies a backend fetch result
    ///
    /// A response with a non-2xx status is a permanent failure; error
    /// values split on [`BackendError::is_transient`].
    pub fn classify(result: Result<FetchResponse, BackendError>, url: &str) -> AttemptOutcome {
        match result {
            Ok(response) if response.is_success() => AttemptOutcome::Success(response),
            Ok(response) => AttemptOutcome::Permanent(BackendError::Http {
                url: url.to_string(),
                status: response.status,
            }),
            Err(e) if e.is_transient() => AttemptOutcome::Transient(e),
            Err(e) => AttemptOutcome::Permanent(e),
        }
    }
}
