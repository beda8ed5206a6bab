//! Retry with exponential backoff for rate-limited model calls.
//!
//! Only rate-limit failures are retried. They are recognized from the error's
//! text, since the service reports them both as HTTP 429 and as a
//! `RESOURCE_EXHAUSTED` status. Every other failure is returned on the first
//! attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

/// Lowercase markers that identify a rate-limit error message.
const RATE_LIMIT_MARKERS: &[&str] = &["429", "resource_exhausted", "resource exhausted", "rate limit"];

pub const DEFAULT_MAX_RETRIES: u32 = 4;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. The operation runs at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each subsequent one.
    pub initial_delay: Duration,
    /// Upper bound (exclusive) of the uniform random jitter added to each delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and batch tools.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the delay before retry number `retry` (1-based):
    /// `initial_delay * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }

    fn jitter(&self) -> Duration {
        let bound = self.max_jitter.as_millis() as u64;
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..bound))
    }
}

/// Whether an error's text marks it as a rate-limit condition.
pub fn is_rate_limit_error<E: fmt::Display + ?Sized>(error: &E) -> bool {
    let message = error.to_string().to_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Run `operation`, retrying rate-limit failures according to `policy`.
///
/// Before retry `n` the call sleeps `initial_delay * 2^(n-1)` plus a random
/// jitter. When the retry budget is spent the last error is returned; any
/// error that is not a rate limit is returned immediately.
pub async fn call_with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut retries = 0;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let rate_limited = is_rate_limit_error(&err);
        if rate_limited && retries < policy.max_retries {
            retries += 1;
            let delay = policy.backoff(retries) + policy.jitter();
            warn!(
                attempt = retries,
                max_retries = policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "rate limited, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        if rate_limited {
            error!(retries, "call failed after persistent rate limiting");
        } else {
            error!(error = %err, "call failed with a non-retriable error");
        }
        return Err(err);
    }
}
