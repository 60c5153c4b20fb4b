use std::fmt::Display;
use std::time::Duration;

use hyperxgen_config::RetryConfig;
use tokio_util::sync::CancellationToken;

/// Errors the retry wrapper can inspect
pub trait RetryableError {
    /// Whether the failure reports rate limiting or quota exhaustion
    fn is_rate_limited(&self) -> bool;

    /// Error returned when the caller cancels between attempts
    fn cancelled() -> Self;
}

/// Exponential backoff settings for rate-limited calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay,
        }
    }
}

impl RetryPolicy {
    /// Wait before the given retry, counting from 1
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(retry))
    }
}

/// Run `f`, retrying rate-limited failures with exponential backoff.
///
/// Every other error, and a rate-limited error once retries run out, is
/// returned unchanged. Cancellation is observed before each attempt and
/// while sleeping, never inside `f`.
pub async fn reliable_request<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut f: F,
) -> Result<T, E>
where
    E: RetryableError + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(E::cancelled());
        }

        let error = match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_rate_limited() && retry < policy.max_retries => e,
            Err(e) => return Err(e),
        };

        retry += 1;
        let delay = policy.delay_for(retry);

        tracing::warn!(
            retry,
            max_retries = policy.max_retries,
            delay = ?delay,
            error = %error,
            "rate limited, backing off"
        );

        tokio::select! {
            () = cancel.cancelled() => return Err(E::cancelled()),
            () = tokio::time::sleep(delay) => {}
        }
    }
}
