#![allow(clippy::must_use_candidate)]

pub mod engine;
mod env;
mod loader;
pub mod logging;
pub mod retry;

use serde::Deserialize;

pub use engine::*;
pub use logging::*;
pub use retry::*;

/// Top-level HyperXGen configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Engine selected when a caller does not pick one explicitly
    #[serde(default)]
    pub default_engine: Engine,
    /// Multimodal (primary) engine configuration
    #[serde(default)]
    pub primary: PrimaryEngineConfig,
    /// Text-to-image (secondary) engine configuration
    #[serde(default)]
    pub secondary: SecondaryEngineConfig,
    /// Quota backoff applied around every engine call
    #[serde(default)]
    pub retry: RetryConfig,
    /// Log output configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}
