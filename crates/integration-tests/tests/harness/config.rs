//! Programmatic configuration builder for integration tests

use std::time::Duration;

use hyperxgen_config::{Config, Engine};
use secrecy::SecretString;

pub const PRIMARY_KEY: &str = "gm-test-key";
pub const SECONDARY_TOKEN: &str = "hf_test_token";

/// Builder for constructing test configurations
///
/// Delays are shortened so retry and cold-start paths run in milliseconds.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.retry.base_delay = Duration::from_millis(5);
        config.secondary.cold_start.max_delay = Duration::from_millis(50);

        Self { config }
    }

    /// Point the primary engine at a mock backend
    pub fn with_primary(mut self, base_url: &str) -> Self {
        self.config.primary.api_key = Some(SecretString::from(PRIMARY_KEY));
        self.config.primary.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    /// Point the secondary engine at a mock backend
    pub fn with_secondary(mut self, base_url: &str) -> Self {
        self.config.secondary.token = Some(SecretString::from(SECONDARY_TOKEN));
        self.config.secondary.base_url = Some(base_url.parse().expect("valid URL"));
        self
    }

    pub fn with_secondary_token(mut self, token: Option<&str>) -> Self {
        self.config.secondary.token = token.map(SecretString::from);
        self
    }

    pub fn with_cold_start(mut self, max_retries: u32, max_delay: Duration) -> Self {
        self.config.secondary.cold_start.max_retries = max_retries;
        self.config.secondary.cold_start.max_delay = max_delay;
        self
    }

    pub fn with_default_engine(mut self, engine: Engine) -> Self {
        self.config.default_engine = engine;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
