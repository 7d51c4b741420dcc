//! Sequential retry with exponential backoff around a single fallible call.

use log::{debug, warn};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::RetryConfig;

/// How many times to attempt a call and how long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Wait after the first failure; doubles after each further failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait inserted after failed attempt `attempt` (0-indexed): `base_delay * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Where the executor is in its attempt loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting(u32),
    Waiting(u32),
    Succeeded,
    Exhausted,
}

impl RetryState {
    /// Next state after attempt `attempt` finished
    pub fn after_attempt(attempt: u32, succeeded: bool, max_attempts: u32) -> Self {
        if succeeded {
            RetryState::Succeeded
        } else if attempt + 1 < max_attempts.max(1) {
            RetryState::Waiting(attempt)
        } else {
            RetryState::Exhausted
        }
    }
}

/// Run `work` until it succeeds or the policy's attempts are used up.
///
/// `work` receives the 0-indexed attempt number. Attempts never overlap. On
/// exhaustion the error from the final attempt is returned unchanged.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut work: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        let outcome = work(attempt).await;
        let next = RetryState::after_attempt(attempt, outcome.is_ok(), max_attempts);
        let e = match outcome {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        warn!("Attempt {}/{} failed: {}", attempt + 1, max_attempts, e);

        match next {
            RetryState::Waiting(failed) => {
                let delay = policy.delay_for(failed);
                debug!("Waiting {:?} before retry", delay);
                sleep(delay).await;
                attempt = failed + 1;
            }
            _ => return Err(e),
        }
    }
}
