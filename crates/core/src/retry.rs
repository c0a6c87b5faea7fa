//! Bounded retry for connecting to external backends
//!
//! One policy type is shared by every dependency (object store, queue,
//! database, container runtime) instead of hand-written loops per call site.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(5, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: base_delay,
            backoff: Backoff::Exponential,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay to wait after the given zero-based failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => self.delay * 2u32.saturating_pow(attempt.min(16)),
        }
    }

    /// Run `operation` until it succeeds or the attempts are exhausted,
    /// returning the last error.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        error!(
                            operation = operation,
                            attempts = attempt,
                            error = %err,
                            "Giving up after max attempts"
                        );
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        delay = ?delay,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
