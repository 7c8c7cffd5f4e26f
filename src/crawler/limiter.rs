//! Token-bucket rate limiter
//!
//! One limiter instance is shared by every fetch attempt (including
//! retries) within a single crawl. Tokens refill continuously based on
//! elapsed wall time, capped at the bucket size, so short bursts up to
//! the bucket size pass without waiting.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token bucket configured as `rate = 1 / rate_limit_seconds`
#[derive(Debug)]
pub struct RateLimiter {
    /// Tokens per second; infinite disables limiting entirely
    rate: f64,

    /// Bucket capacity
    burst: f64,

    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a limiter from the per-request spacing in seconds
    ///
    /// `rate_limit_seconds <= 0` yields an unlimited limiter. The bucket
    /// starts full, so the first `burst` acquisitions never wait.
    pub fn new(rate_limit_seconds: f64, burst: u32) -> RateLimiter {
        let rate = if rate_limit_seconds <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / rate_limit_seconds
        };
        let burst = f64::from(burst.max(1));
        RateLimiter {
            rate,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Suspends the caller until a token is available
    ///
    /// Returns the wait actually incurred. Safe to call from many tasks
    /// concurrently; the lock is only held to update the bucket, never
    /// across a sleep.
    pub async fn acquire(&self) -> Duration {
        if self.rate.is_infinite() {
            return Duration::ZERO;
        }

        let start = Instant::now();
        loop {
            let wait = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.burst);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };

            match wait {
                None => return start.elapsed(),
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}
