pub mod gemini;
pub mod inference;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{ImageHandle, SourceImage};

/// Longest upstream body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Per-call options for the multimodal engine
#[derive(Debug, Clone, Default)]
pub struct PrimaryOptions {
    /// Synthesis model; the adapter default applies when unset
    pub model: Option<String>,
    /// Sampling temperature; the adapter default applies when unset
    pub temperature: Option<f32>,
}

/// Per-call options for the text-to-image engine
#[derive(Debug, Clone, Default)]
pub struct SecondaryOptions {
    pub model: Option<String>,
    /// Token preferred over the configured default
    pub token_override: Option<SecretString>,
}

/// Multimodal engine that accepts an image and text and returns an image
#[async_trait]
pub trait PrimaryEngine: Send + Sync {
    /// Generate an image from a prompt and an optional reference image
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&SourceImage>,
        options: &PrimaryOptions,
    ) -> Result<ImageHandle>;

    /// Produce a text description of an image's visual content
    async fn describe_image(&self, image: &SourceImage, options: &PrimaryOptions) -> Result<String>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Text-only generation engine
#[async_trait]
pub trait SecondaryEngine: Send + Sync {
    /// Generate an image from a prompt
    async fn generate(
        &self,
        prompt: &str,
        options: &SecondaryOptions,
        cancel: &CancellationToken,
    ) -> Result<ImageHandle>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Clip an upstream body for inclusion in an error message
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}
