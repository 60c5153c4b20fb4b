//! Multimodal engine on the Generative Language API

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hyperxgen_config::{Engine, PrimaryEngineConfig, usable_token};
use hyperxgen_prompt::SynthesisMode;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{PrimaryEngine, PrimaryOptions, truncate_body};
use crate::error::{EngineError, Result};
use crate::protocol::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::types::{ImageHandle, SourceImage};

/// Default Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model families this engine must never be pointed at
const FORBIDDEN_MODEL_FAMILIES: &[&str] = &[
    "veo",
    "tts",
    "imagen-4",
    "gemini-3-pro-image",
    "native-audio",
];

const SYSTEM_INSTRUCTION: &str = "You are a graphic design engine producing abstract, stylized \
    artwork. Output flat, high-contrast compositions with clean shapes. Never render text, \
    captions, watermarks or annotations unless the brief is explicitly typographic. Refuse \
    photorealistic depictions of real people and any sensitive or explicit content.";

const DESCRIBE_INSTRUCTION: &str = "Describe the visual content of this image for a designer: \
    the main subject, its silhouette and composition, the color palette and the rendering \
    style. Reply with one dense paragraph and nothing else.";

const REFINE_INSTRUCTION: &str =
    "Prompt architect. Optimize visual descriptors. Return the prompt only, without quotes.";

const REFINE_TEMPERATURE: f32 = 0.7;

/// Multimodal primary engine
pub struct GeminiEngine {
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    model: String,
    describe_model: String,
    temperature: f32,
}

impl GeminiEngine {
    /// Create from engine configuration
    ///
    /// Placeholder or blank API keys are discarded here so that calls fail
    /// with `Auth` before any network I/O.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(config: &PrimaryEngineConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            client: Client::new(),
            base_url,
            api_key: usable_token(config.api_key.as_ref()),
            model: config.model.clone(),
            describe_model: config.describe_model.clone(),
            temperature: config.temperature,
        }
    }

    /// Rewrite a brief into a tighter prompt for the given synthesis mode
    ///
    /// Falls back to the original prompt when the model returns nothing.
    pub async fn refine_prompt(
        &self,
        prompt: &str,
        mode: SynthesisMode,
        options: &PrimaryOptions,
    ) -> Result<String> {
        validate_model_access(&self.describe_model)?;

        let request = GenerateContentRequest {
            contents: vec![user_content(vec![Part::text(format!(
                "Refine for {} synthesis engine: \"{prompt}\".",
                mode.as_str()
            ))])],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(REFINE_INSTRUCTION)],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(options.temperature.unwrap_or(REFINE_TEMPERATURE)),
                response_modalities: None,
            }),
        };

        let response = self.send(&self.describe_model, &request).await?;
        let refined = response.text().replace('"', "");
        let refined = refined.trim();

        if refined.is_empty() {
            Ok(prompt.to_owned())
        } else {
            Ok(refined.to_owned())
        }
    }

    fn generate_url(&self, model: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}:generateContent")
    }

    async fn send(&self, model: &str, request: &GenerateContentRequest) -> Result<GenerateContentResponse> {
        let Some(api_key) = &self.api_key else {
            return Err(EngineError::Auth {
                engine: Engine::Primary,
                message: "no usable API key configured".to_owned(),
            });
        };

        tracing::debug!(engine = %Engine::Primary, model, "sending generateContent request");

        let response = self
            .client
            .post(self.generate_url(model))
            .query(&[("key", api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::error!(engine = %Engine::Primary, error = %e, "upstream request failed");
                EngineError::NetworkBlocked {
                    engine: Engine::Primary,
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(engine = %Engine::Primary, status = %status, "upstream returned error");
            return Err(classify_failure(status, &body));
        }

        response.json().await.map_err(|e| EngineError::InvalidResponse {
            engine: Engine::Primary,
            message: e.without_url().to_string(),
        })
    }
}

#[async_trait]
impl PrimaryEngine for GeminiEngine {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&SourceImage>,
        options: &PrimaryOptions,
    ) -> Result<ImageHandle> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        validate_model_access(model)?;

        let mut parts = Vec::with_capacity(2);
        if let Some(image) = image {
            parts.push(Part::inline(&image.mime_type, image.to_base64()));
        }
        parts.push(Part::text(prompt));

        let request = GenerateContentRequest {
            contents: vec![user_content(parts)],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text(SYSTEM_INSTRUCTION)],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(options.temperature.unwrap_or(self.temperature)),
                response_modalities: Some(vec!["TEXT".to_owned(), "IMAGE".to_owned()]),
            }),
        };

        let response = self.send(model, &request).await?;

        let Some(inline) = response.first_inline_data() else {
            let err = refusal(&response);
            tracing::warn!(engine = %Engine::Primary, error = %err, "no image in response");
            return Err(err);
        };

        let bytes = STANDARD
            .decode(&inline.data)
            .map_err(|e| EngineError::InvalidResponse {
                engine: Engine::Primary,
                message: format!("image data is not valid base64: {e}"),
            })?;

        if bytes.is_empty() {
            tracing::warn!(engine = %Engine::Primary, "empty image payload in response");
            return Err(EngineError::InvalidResponse {
                engine: Engine::Primary,
                message: "image data is empty".to_owned(),
            });
        }

        tracing::debug!(engine = %Engine::Primary, bytes = bytes.len(), "image generated");

        Ok(ImageHandle {
            bytes,
            mime_type: inline.mime_type.clone(),
        })
    }

    async fn describe_image(&self, image: &SourceImage, _options: &PrimaryOptions) -> Result<String> {
        validate_model_access(&self.describe_model)?;

        let request = GenerateContentRequest {
            contents: vec![user_content(vec![
                Part::inline(&image.mime_type, image.to_base64()),
                Part::text(DESCRIBE_INSTRUCTION),
            ])],
            system_instruction: None,
            generation_config: None,
        };

        let response = self.send(&self.describe_model, &request).await?;
        let description = response.text().trim().to_owned();

        if description.is_empty() {
            return Err(refusal(&response));
        }

        Ok(description)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Reject model families outside this engine's remit
pub fn validate_model_access(model: &str) -> Result<()> {
    let lowered = model.to_ascii_lowercase();
    if FORBIDDEN_MODEL_FAMILIES.iter().any(|family| lowered.contains(family)) {
        tracing::warn!(engine = %Engine::Primary, model, "blocked access to forbidden model");
        return Err(EngineError::ModelAccessDenied {
            engine: Engine::Primary,
            model: model.to_owned(),
        });
    }
    Ok(())
}

fn user_content(parts: Vec<Part>) -> Content {
    Content {
        role: Some("user".to_owned()),
        parts,
    }
}

fn classify_failure(status: StatusCode, body: &str) -> EngineError {
    let engine = Engine::Primary;
    let message = truncate_body(body);

    match status.as_u16() {
        401 | 403 => EngineError::Auth { engine, message },
        429 => EngineError::Quota { engine, message },
        _ if body.contains("RESOURCE_EXHAUSTED") || body.to_ascii_lowercase().contains("quota") => {
            EngineError::Quota { engine, message }
        }
        400 if body.contains("API key not valid") || body.contains("API_KEY_INVALID") => {
            EngineError::Auth { engine, message }
        }
        code => EngineError::Gateway {
            engine,
            status: code,
            body: message,
        },
    }
}

fn refusal(response: &GenerateContentResponse) -> EngineError {
    let mut details = Vec::new();
    if let Some(reason) = response.finish_reason() {
        details.push(format!("finish reason {reason}"));
    }
    if let Some(reason) = response.block_reason() {
        details.push(format!("block reason {reason}"));
    }
    let text = response.text();
    if !text.trim().is_empty() {
        details.push(format!("model said: {}", truncate_body(&text)));
    }

    let message = if details.is_empty() {
        "no image in response".to_owned()
    } else {
        format!("no image in response ({})", details.join("; "))
    };

    EngineError::SafetyRefusal {
        engine: Engine::Primary,
        message,
    }
}
