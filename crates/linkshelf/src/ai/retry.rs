//! Bounded retry with exponential backoff around a [`CompletionClient`].

use std::thread;
use std::time::Duration;

use super::{AiServiceError, CompletionClient};
use crate::config::RetryConfig;

/// Retries timeouts, HTTP 429 and HTTP 5xx up to `max_attempts` in total.
/// With `max_attempts == 1` every call is a single attempt.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryConfig,
}

impl<C: CompletionClient> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    /// Delay before retry number `retry` (1-based).
    fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let ms = self
            .policy
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.policy.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

impl<C: CompletionClient> CompletionClient for RetryingClient<C> {
    fn complete(&self, system: &str, user: &str) -> Result<String, AiServiceError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.inner.complete(system, user) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff(attempt);
                    log::warn!(
                        "Completion attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
