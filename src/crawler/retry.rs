//! Retry policy for transient failures
//!
//! A failed attempt is retried at the same logical point (the same URL, or
//! the same pagination offset) after an exponentially growing delay. The
//! policy can be unbounded, in which case an operation is retried until it
//! succeeds.

use crate::config::RetryConfig;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Decision returned by the retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop retrying and report the failure
    GiveUp,
    /// Retry after the given delay
    RetryAfter(Duration),
}

/// Exponential backoff with an optional attempt ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts including the first; 0 means unlimited
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on the delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts == 0
    }

    /// Decides what to do after `attempt` failed
    ///
    /// `attempt` is 1-based (1 = the first attempt just failed).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if !self.is_unbounded() && attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        RetryDecision::RetryAfter(self.delay_for(attempt))
    }

    /// Backoff delay after the given failed attempt: base * 2^(attempt-1), capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

/// Returned when an operation kept failing until the policy gave up
#[derive(Debug, Clone, Error)]
#[error("gave up on {target} after {attempts} attempts: {reason}")]
pub struct RetryExhausted {
    /// What was being retried (URL, optionally with offset)
    pub target: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Reason the last attempt failed
    pub reason: String,
}

/// Runs `attempt_fn` until it returns `Ok` or the policy gives up
///
/// `Err` values are transient failure reasons. Each retry is logged at warn
/// level together with the delay before it.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    mut attempt_fn: F,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let mut attempt = 1u32;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(reason) => match policy.decide(attempt) {
                RetryDecision::GiveUp => {
                    return Err(RetryExhausted {
                        target: target.to_string(),
                        attempts: attempt,
                        reason,
                    });
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        "{}. Retrying {} (attempt {}) in {:?}",
                        reason,
                        target,
                        attempt.saturating_add(1),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            },
        }
    }
}
