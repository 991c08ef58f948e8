//! @ai:module:intent Bounded retries with exponential backoff for judge calls
//! @ai:module:layer infrastructure
//! @ai:module:public_api RetryPolicy
//! @ai:module:stateless true

use crate::config::ApiConfig;
use crate::runner::client::ClientError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Upper bound of the random jitter added to each backoff.
const MAX_JITTER_MS: u64 = 500;

/// @ai:intent Retry policy: `base * 2^attempt` plus jitter, retryable errors only
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter: true,
        }
    }

    /// @ai:intent A policy that never retries
    /// @ai:effects pure
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.max_retries, config.retry_base_delay())
    }

    /// @ai:intent Deterministic part of the delay before retry number `attempt` (0-based)
    /// @ai:effects pure
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// @ai:intent Run `op`, retrying retryable failures up to `max_retries` times
    /// @ai:post returns the last error once retries are exhausted or the error is permanent
    /// @ai:effects time
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let mut delay = self.backoff(attempt);
                    if self.jitter {
                        delay += Duration::from_millis(rand::rng().random_range(0..MAX_JITTER_MS));
                    }

                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "judge request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
