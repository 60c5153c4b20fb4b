use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if [`Config::parse`] fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::parse(&raw)?;

        tracing::debug!(config_path = %path.display(), "configuration loaded");

        Ok(config)
    }

    /// Parse configuration from raw TOML text
    ///
    /// Expands `{{ env.VAR }}` placeholders, deserializes, then validates.
    ///
    /// # Errors
    ///
    /// Returns an error if variable expansion, TOML parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a model identifier is malformed or a numeric
    /// bound is out of range
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_primary()?;
        self.validate_secondary()?;
        self.validate_retry()?;
        Ok(())
    }

    fn validate_primary(&self) -> anyhow::Result<()> {
        let primary = &self.primary;

        if primary.model.trim().is_empty() || primary.describe_model.trim().is_empty() {
            anyhow::bail!("primary.model and primary.describe_model must not be empty");
        }

        if !(0.0..=2.0).contains(&primary.temperature) {
            anyhow::bail!(
                "primary.temperature must be between 0.0 and 2.0, got {}",
                primary.temperature
            );
        }

        Ok(())
    }

    fn validate_secondary(&self) -> anyhow::Result<()> {
        let secondary = &self.secondary;

        if secondary.model.trim().is_empty() || secondary.model.contains(char::is_whitespace) {
            anyhow::bail!("secondary.model must be a non-empty model id without whitespace");
        }

        if secondary.cold_start.max_retries > 10 {
            anyhow::bail!("secondary.cold_start.max_retries exceeds maximum of 10");
        }

        if secondary.cold_start.max_delay.is_zero() {
            anyhow::bail!("secondary.cold_start.max_delay must be greater than 0");
        }

        Ok(())
    }

    fn validate_retry(&self) -> anyhow::Result<()> {
        if self.retry.max_retries > 10 {
            anyhow::bail!("retry.max_retries exceeds maximum of 10");
        }

        Ok(())
    }
}
