// src/utils/retry.rs

//! Bounded retry with a fixed delay between attempts.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Fixed pause between attempts (no backoff growth)
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Retry without pausing.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    /// Three attempts, five seconds apart.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

/// The operation failed on every attempt.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gave up after {} attempt(s): {}",
            self.attempts, self.last_error
        )
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. The delay is only slept
/// between attempts, never after the last one.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= max_attempts => {
                return Err(RetryError {
                    attempts: attempt,
                    last_error: error,
                });
            }
            Err(error) => {
                log::warn!(
                    "Attempt {}/{} failed: {}. Retrying in {}s",
                    attempt,
                    max_attempts,
                    error,
                    policy.delay.as_secs()
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
        }
    }
}
