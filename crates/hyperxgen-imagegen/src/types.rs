use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hyperxgen_config::Engine;
use hyperxgen_prompt::StyleDna;
use secrecy::SecretString;

use crate::error::{EngineError, Result};

/// MIME type assumed for bare base64 input
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Reference image supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL or bare base64
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let (mime_type, payload) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| EngineError::InvalidImage("data URL has no payload".to_owned()))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| EngineError::InvalidImage("data URL is not base64".to_owned()))?;
                let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
                (mime, payload)
            }
            None => (DEFAULT_IMAGE_MIME, input),
        };

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| EngineError::InvalidImage(e.to_string()))?;
        if bytes.is_empty() {
            return Err(EngineError::InvalidImage("image payload is empty".to_owned()));
        }

        Ok(Self::new(bytes, mime_type))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Binary image produced by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageHandle {
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Render as a `data:` URL for display surfaces
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Per-call engine selection and overrides
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub engine: Engine,
    /// Primary sampling temperature; the configured default applies when unset
    pub temperature: Option<f32>,
    /// Model for the selected engine; the configured default applies when unset
    pub model: Option<String>,
    /// Locally stored secondary token, preferred over the configured one
    pub secondary_token_override: Option<SecretString>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: Option<SourceImage>,
    pub engine_config: EngineConfig,
    pub style_dna: Option<StyleDna>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: None,
            engine_config: EngineConfig::default(),
            style_dna: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: SourceImage) -> Self {
        self.source_image = Some(image);
        self
    }

    #[must_use]
    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    #[must_use]
    pub fn with_style_dna(mut self, dna: StyleDna) -> Self {
        self.style_dna = Some(dna);
        self
    }
}

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image: ImageHandle,
    /// Engine that actually produced the image
    pub engine_used: Engine,
    /// Whether the secondary engine failed and the primary took over
    pub fallback_triggered: bool,
}
