//! Text-to-image engine on the hosted inference API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hyperxgen_config::{ColdStartConfig, Engine, SecondaryEngineConfig, usable_token};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{SecondaryEngine, SecondaryOptions, truncate_body};
use crate::error::{EngineError, Result};
use crate::types::ImageHandle;

/// Default inference API base URL
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// MIME type assumed when the response omits `Content-Type`
const FALLBACK_IMAGE_MIME: &str = "image/png";

const IMAGE_SIZE: u32 = 1024;

const FAST_MODEL_MARKERS: &[&str] = &["schnell", "turbo", "lightning"];
const HIGH_FIDELITY_MODEL_MARKERS: &[&str] = &["dev", "pro", "xl"];

const NETWORK_GUIDANCE: &str = "The request was blocked before reaching the inference API. \
    Check ad-blockers, firewalls and VPNs, and confirm the access token is valid.";

/// Host-side view of network availability
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Connectivity probe for hosts without an offline signal
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceParameters {
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl InferenceParameters {
    /// Pick step count and guidance from markers in the model name
    pub fn for_model(model: &str) -> Self {
        let model = model.to_ascii_lowercase();
        let has_marker = |markers: &[&str]| markers.iter().any(|m| model.contains(m));

        let (num_inference_steps, guidance_scale) = if has_marker(FAST_MODEL_MARKERS) {
            (4, 0.0)
        } else if has_marker(HIGH_FIDELITY_MODEL_MARKERS) {
            (28, 3.5)
        } else {
            (30, 7.5)
        };

        Self {
            num_inference_steps,
            guidance_scale,
            width: IMAGE_SIZE,
            height: IMAGE_SIZE,
        }
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

/// Body of a 503 while the model is loading
#[derive(Deserialize)]
struct LoadingStatus {
    #[serde(default)]
    estimated_time: Option<f64>,
}

/// Secondary engine backed by a hosted diffusion model
pub struct InferenceEngine {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
    model: String,
    cold_start: ColdStartConfig,
    connectivity: Arc<dyn Connectivity>,
}

impl InferenceEngine {
    /// Create from engine configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(config: &SecondaryEngineConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            client: Client::new(),
            base_url,
            token: usable_token(config.token.as_ref()),
            model: config.model.clone(),
            cold_start: config.cold_start.clone(),
            connectivity: Arc::new(AssumeOnline),
        }
    }

    /// Replace the connectivity probe consulted before each request
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    fn model_url(&self, model: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models/{model}")
    }

    /// Per-call override first, then the configured token
    fn resolve_token(&self, options: &SecondaryOptions) -> Result<SecretString> {
        usable_token(options.token_override.as_ref())
            .or_else(|| self.token.clone())
            .ok_or_else(|| EngineError::Auth {
                engine: Engine::Secondary,
                message: "no usable access token; store one locally or set secondary.token".to_owned(),
            })
    }
}

#[async_trait]
impl SecondaryEngine for InferenceEngine {
    async fn generate(
        &self,
        prompt: &str,
        options: &SecondaryOptions,
        cancel: &CancellationToken,
    ) -> Result<ImageHandle> {
        let token = self.resolve_token(options)?;

        if !self.connectivity.is_online() {
            return Err(EngineError::NetworkBlocked {
                engine: Engine::Secondary,
                message: format!("host reports no network connection. {NETWORK_GUIDANCE}"),
            });
        }

        let model = options.model.as_deref().unwrap_or(&self.model);
        let url = self.model_url(model);
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters::for_model(model),
        };
        let mut retries = 0;

        loop {
            tracing::debug!(engine = %Engine::Secondary, model, "sending inference request");

            let response = self
                .client
                .post(&url)
                .bearer_auth(token.expose_secret())
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(engine = %Engine::Secondary, error = %e, "upstream request failed");
                    EngineError::NetworkBlocked {
                        engine: Engine::Secondary,
                        message: format!("{e}. {NETWORK_GUIDANCE}"),
                    }
                })?;

            let status = response.status();

            if status == StatusCode::SERVICE_UNAVAILABLE {
                let text = response.text().await.unwrap_or_default();

                if retries >= self.cold_start.max_retries {
                    tracing::error!(
                        engine = %Engine::Secondary,
                        model,
                        attempts = retries + 1,
                        "model did not finish loading"
                    );
                    return Err(EngineError::ColdStartTimeout { attempts: retries + 1 });
                }

                retries += 1;
                let estimated = serde_json::from_str::<LoadingStatus>(&text)
                    .ok()
                    .and_then(|s| s.estimated_time);
                let delay = cold_start_delay(estimated, self.cold_start.max_delay);

                tracing::warn!(
                    engine = %Engine::Secondary,
                    model,
                    retry = retries,
                    delay = ?delay,
                    "model is loading, waiting"
                );

                tokio::select! {
                    () = cancel.cancelled() => return Err(EngineError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                tracing::warn!(engine = %Engine::Secondary, status = %status, "upstream returned error");
                return Err(classify_failure(status, &text));
            }

            return read_image(response).await;
        }
    }

    fn name(&self) -> &str {
        "inference"
    }
}

/// Wait before retrying a loading model, capped at `max`
pub(crate) fn cold_start_delay(estimated_secs: Option<f64>, max: Duration) -> Duration {
    estimated_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map_or(max, |delay| delay.min(max))
}

fn classify_failure(status: StatusCode, body: &str) -> EngineError {
    let engine = Engine::Secondary;
    let message = truncate_body(body);

    match status.as_u16() {
        401 | 403 => EngineError::Auth { engine, message },
        429 => EngineError::Quota { engine, message },
        code => EngineError::Gateway {
            engine,
            status: code,
            body: message,
        },
    }
}

/// Binary payloads the API may label generically are still taken as images
fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || content_type == "application/octet-stream"
}

/// Turn a 2xx response into an image, rejecting JSON, non-image and empty bodies
async fn read_image(response: Response) -> Result<ImageHandle> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    let bytes = response.bytes().await.map_err(|e| EngineError::InvalidResponse {
        engine: Engine::Secondary,
        message: e.to_string(),
    })?;

    if content_type.as_deref().is_some_and(|ct| ct.contains("json")) {
        let text = String::from_utf8_lossy(&bytes);
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| match v.get("error") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
                None => None,
            })
            .unwrap_or_else(|| text.into_owned());

        tracing::warn!(engine = %Engine::Secondary, status, "json payload instead of an image");
        return Err(EngineError::Gateway {
            engine: Engine::Secondary,
            status,
            body: truncate_body(&message),
        });
    }

    if let Some(ct) = content_type.as_deref().filter(|ct| !is_image_content_type(ct)) {
        tracing::warn!(engine = %Engine::Secondary, status, content_type = ct, "non-image payload");
        return Err(EngineError::Gateway {
            engine: Engine::Secondary,
            status,
            body: truncate_body(&format!(
                "unexpected content type {ct}: {}",
                String::from_utf8_lossy(&bytes)
            )),
        });
    }

    if bytes.is_empty() {
        return Err(EngineError::Gateway {
            engine: Engine::Secondary,
            status,
            body: "empty response body".to_owned(),
        });
    }

    tracing::debug!(engine = %Engine::Secondary, bytes = bytes.len(), "image generated");

    Ok(ImageHandle {
        bytes: bytes.to_vec(),
        mime_type: content_type.unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_owned()),
    })
}
