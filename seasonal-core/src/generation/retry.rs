//! Bounded retry with linear backoff.

use super::GenerateError;
use crate::llm::LlmConfig;
use std::future::Future;
use std::time::Duration;

/// How many times to retry a generation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Multiplied by the number of failed attempts so far.
    pub base_delay: Duration,
    /// Flat wait after a rate-limited attempt.
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            rate_limit_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_delay,
            rate_limit_delay: config.retry_delay,
        }
    }

    /// Same attempt budget, no waiting.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait before the next attempt, given the error and the failures so far.
    pub fn delay_after(&self, error: &GenerateError, failures: u32) -> Duration {
        if error.is_rate_limited() {
            self.rate_limit_delay
        } else {
            self.base_delay
                .checked_mul(failures)
                .unwrap_or(Duration::MAX)
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The last error is returned
    /// unchanged once every attempt has failed.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, GenerateError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerateError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(label, attempt, "Generation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= self.total_attempts() => {
                    tracing::error!(label, attempt, error = %e, "Generation failed, no retries left");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_after(&e, attempt);
                    if e.is_rate_limited() {
                        tracing::warn!(label, attempt, delay_ms = delay.as_millis() as u64, "Rate limited, retrying");
                    } else {
                        tracing::warn!(
                            label,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Generation attempt failed, retrying"
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
