//! Bounded retry with exponential backoff for source calls.

use std::future::Future;
use std::time::Duration;

use medscout_common::FetchError;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = max_retries + 1.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (0-indexed): base * 2^attempt, capped.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Worst-case time spent sleeping across all retries.
    pub fn max_total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|i| self.backoff_delay(i)).sum()
    }
}

/// Run `op` until it succeeds, fails terminally, or exhausts the retry
/// budget. Only transient failures are retried; a terminal failure
/// returns immediately without a second attempt. On exhaustion the last
/// transient error is returned.
pub async fn call_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff_delay(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off: {e}"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
