use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Default multimodal model used for image synthesis
pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash-image";

/// Default multimodal model used for text-only calls (descriptions, refinement)
pub const DEFAULT_DESCRIBE_MODEL: &str = "gemini-2.5-flash";

/// Default text-to-image model served by the inference API
pub const DEFAULT_SECONDARY_MODEL: &str = "black-forest-labs/FLUX.1-schnell";

/// Which backend serves a generation request
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    /// Multimodal engine (prompt plus optional image)
    #[default]
    Primary,
    /// Text-to-image inference engine
    Secondary,
}

impl Engine {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the multimodal engine
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimaryEngineConfig {
    /// API key
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model used for image synthesis
    #[serde(default = "default_primary_model")]
    pub model: String,
    /// Model used for image descriptions and prompt refinement
    #[serde(default = "default_describe_model")]
    pub describe_model: String,
    /// Sampling temperature used when the request does not set one
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for PrimaryEngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_primary_model(),
            describe_model: default_describe_model(),
            temperature: default_temperature(),
        }
    }
}

/// Configuration for the text-to-image inference engine
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecondaryEngineConfig {
    /// Environment-provided token, used when no per-request override is supplied
    #[serde(default)]
    pub token: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Inference model identifier (e.g. "black-forest-labs/FLUX.1-schnell")
    #[serde(default = "default_secondary_model")]
    pub model: String,
    /// Cold-start handling for models that are still loading
    #[serde(default)]
    pub cold_start: ColdStartConfig,
}

impl Default for SecondaryEngineConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: None,
            model: default_secondary_model(),
            cold_start: ColdStartConfig::default(),
        }
    }
}

/// Bounds for waiting on a model that answers 503 while loading
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColdStartConfig {
    /// Number of retries after the first 503
    #[serde(default = "default_cold_start_retries")]
    pub max_retries: u32,
    /// Upper bound on a single wait, also used when the server gives no estimate
    #[serde(
        default = "default_cold_start_delay",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub max_delay: Duration,
}

impl Default for ColdStartConfig {
    fn default() -> Self {
        Self {
            max_retries: default_cold_start_retries(),
            max_delay: default_cold_start_delay(),
        }
    }
}

/// Normalize a configured token, discarding values that cannot authenticate
///
/// Build pipelines tend to leave quoted, `undefined`, `null` or placeholder
/// strings behind when a variable is unset.
pub fn usable_token(token: Option<&SecretString>) -> Option<SecretString> {
    let raw = token?.expose_secret().replace(['\'', '"'], "");
    let trimmed = raw.trim();

    if trimmed.is_empty()
        || trimmed == "undefined"
        || trimmed == "null"
        || trimmed.to_ascii_uppercase().starts_with("PLACEHOLDER")
    {
        return None;
    }

    Some(SecretString::from(trimmed.to_owned()))
}

fn default_primary_model() -> String {
    DEFAULT_PRIMARY_MODEL.to_owned()
}

fn default_describe_model() -> String {
    DEFAULT_DESCRIBE_MODEL.to_owned()
}

fn default_secondary_model() -> String {
    DEFAULT_SECONDARY_MODEL.to_owned()
}

const fn default_temperature() -> f32 {
    0.1
}

const fn default_cold_start_retries() -> u32 {
    5
}

const fn default_cold_start_delay() -> Duration {
    Duration::from_secs(10)
}
