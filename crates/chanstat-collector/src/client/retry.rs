//! Back-off policy for channel bridge requests.
//!
//! Used for channel resolution and message batch fetches only. Discussion
//! thread lookups are single-shot.

use std::future::Future;
use std::time::Duration;

use crate::error::ChannelClientError;

/// Doubling back-off with a ceiling and ±25 % jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    /// No retries.
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Un-jittered delay before retry number `attempt` (1-based).
    pub(crate) fn backoff_ms(&self, attempt: u32) -> u64 {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms)
    }

    /// Runs `operation`, retrying transient failures per this policy.
    pub(crate) async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ChannelClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChannelClientError>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !is_retriable(&err) || attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;

            let delay_ms = jitter(self.backoff_ms(attempt));
            tracing::warn!(
                attempt,
                max_retries = self.max_retries,
                delay_ms,
                error = %err,
                "channel bridge transient error, retrying after back-off"
            );
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jitter(delay_ms: u64) -> u64 {
    (delay_ms as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Timeouts, connection failures, 5xx and 429 (flood wait) are worth retrying.
pub(crate) fn is_retriable(err: &ChannelClientError) -> bool {
    match err {
        ChannelClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ChannelClientError::UnexpectedStatus { status, .. } => *status >= 500 || *status == 429,
        ChannelClientError::Deserialize { .. }
        | ChannelClientError::NotFound { .. }
        | ChannelClientError::InvalidBaseUrl { .. }
        | ChannelClientError::Unavailable(_) => false,
    }
}
