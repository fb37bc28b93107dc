//! Retry with exponential backoff for Reader API mutations
//!
//! Deletes and location updates go through [`RetryPolicy::run`]. Only
//! transient failures (timeouts, connection errors, 429 and 5xx) are retried;
//! a `Retry-After` hint from the server replaces the computed delay. Sleeps use
//! `tokio::time`, so tests can drive the policy with a paused clock.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;

use crate::Result;

/// Randomization applied to each backoff delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Use the exponential delay as-is
    None,
    /// Draw uniformly from `[0, delay]`
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on the total time spent sleeping between attempts
    pub max_elapsed: Duration,
    pub jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_elapsed: Duration::from_secs(60),
            jitter: Jitter::Full,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Exponential delay before retry number `attempt` (1-based)
    ///
    /// Base delay doubling each attempt, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn jittered(&self, delay: Duration) -> Duration {
        match self.jitter {
            Jitter::None => delay,
            Jitter::Full => {
                let millis = delay.as_millis() as u64;
                Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
            }
        }
    }

    /// Run `operation`, retrying transient failures
    ///
    /// Returns the last error once attempts are exhausted, the next wait would
    /// exceed `max_elapsed`, or the error is not transient.
    pub async fn run<F, Fut, T>(&self, label: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = e
                        .retry_after()
                        .unwrap_or_else(|| self.jittered(self.backoff_delay(attempt)));

                    if started.elapsed() + delay > self.max_elapsed {
                        tracing::warn!(
                            error = %e,
                            attempt,
                            "Giving up on {} after {} tries: retry budget exhausted",
                            label,
                            attempt
                        );
                        return Err(e);
                    }

                    tracing::debug!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        "Retrying {} in {:.1} seconds",
                        label,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::warn!(error = %e, "Giving up on {} after {} tries", label, attempt);
                    }
                    return Err(e);
                }
            }
        }
    }
}
