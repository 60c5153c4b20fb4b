use std::time::Duration;

use serde::Deserialize;

/// Exponential backoff applied when an engine reports quota exhaustion
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first failed attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// The k-th retry waits `base_delay * 2^k`
    #[serde(
        default = "default_base_delay",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
        }
    }
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_base_delay() -> Duration {
    Duration::from_secs(1)
}
