use std::sync::Arc;

use hyperxgen_config::{Config, Engine};
use hyperxgen_prompt::{SynthesisMode, compile, sanitize_for_text_engine};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bridge::{bridged_prompt, describe_reference};
use crate::error::{EngineError, Result};
use crate::provider::gemini::GeminiEngine;
use crate::provider::inference::InferenceEngine;
use crate::provider::{PrimaryEngine, PrimaryOptions, SecondaryEngine, SecondaryOptions};
use crate::retry::{RetryPolicy, reliable_request};
use crate::types::{EngineConfig, GenerationRequest, GenerationResult, ImageHandle, SourceImage};

/// Routes a generation request to an engine, with one-shot fallback
///
/// Stateless between calls; share it behind an `Arc`.
pub struct Orchestrator {
    primary: Arc<dyn PrimaryEngine>,
    secondary: Arc<dyn SecondaryEngine>,
    retry: RetryPolicy,
    default_engine: Engine,
}

impl Orchestrator {
    pub fn new(
        primary: Arc<dyn PrimaryEngine>,
        secondary: Arc<dyn SecondaryEngine>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            secondary,
            retry,
            default_engine: Engine::default(),
        }
    }

    /// Build the orchestrator with the HTTP engines described by `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_engine: config.default_engine,
            ..Self::new(
                Arc::new(GeminiEngine::new(&config.primary)),
                Arc::new(InferenceEngine::new(&config.secondary)),
                RetryPolicy::from(&config.retry),
            )
        }
    }

    /// Start a request targeting the configured default engine
    pub fn request(&self, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(prompt).with_engine_config(EngineConfig {
            engine: self.default_engine,
            ..EngineConfig::default()
        })
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.generate_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Generate with the selected engine, falling back once to the primary
    /// engine when the secondary fails for an infrastructure reason.
    #[tracing::instrument(
        skip_all,
        fields(request_id = %Uuid::new_v4(), engine = %request.engine_config.engine)
    )]
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        match request.engine_config.engine {
            Engine::Primary => {
                let options = PrimaryOptions {
                    model: request.engine_config.model.clone(),
                    temperature: request.engine_config.temperature,
                };
                let image = self
                    .call_primary(&request.prompt, request.source_image.as_ref(), &options, cancel)
                    .await?;

                Ok(GenerationResult {
                    image,
                    engine_used: Engine::Primary,
                    fallback_triggered: false,
                })
            }
            Engine::Secondary => self.generate_secondary(request, cancel).await,
        }
    }

    /// Compile `subject` into the request prompt, then generate
    ///
    /// The request's Style DNA and image presence feed the compiler.
    pub async fn compile_and_generate(
        &self,
        subject: &str,
        mode: SynthesisMode,
        extra_directives: Option<&str>,
        mut request: GenerationRequest,
    ) -> Result<GenerationResult> {
        request.prompt = compile(
            subject,
            mode,
            request.style_dna.as_ref(),
            extra_directives,
            request.source_image.is_some(),
        );
        self.generate(&request).await
    }

    async fn generate_secondary(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        let config = &request.engine_config;
        let mut prompt = sanitize_for_text_engine(&request.prompt);

        if let Some(image) = &request.source_image {
            let description =
                describe_reference(self.primary.as_ref(), image, &self.retry, cancel).await?;
            prompt = bridged_prompt(description.as_deref(), &prompt);
        }

        let options = SecondaryOptions {
            model: config.model.clone(),
            token_override: config.secondary_token_override.clone(),
        };

        let secondary_error = match reliable_request(&self.retry, cancel, || {
            self.secondary.generate(&prompt, &options, cancel)
        })
        .await
        {
            Ok(image) => {
                return Ok(GenerationResult {
                    image,
                    engine_used: Engine::Secondary,
                    fallback_triggered: false,
                });
            }
            Err(e) if e.is_fallback_eligible() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            engine = %Engine::Secondary,
            error = %secondary_error,
            "secondary engine failed, attempting fallback to primary"
        );

        // Fallback runs on the primary defaults with the untouched prompt and image
        let fallback_options = PrimaryOptions {
            model: None,
            temperature: config.temperature,
        };

        match self
            .call_primary(
                &request.prompt,
                request.source_image.as_ref(),
                &fallback_options,
                cancel,
            )
            .await
        {
            Ok(image) => {
                tracing::info!(engine = %Engine::Primary, "fallback succeeded");
                Ok(GenerationResult {
                    image,
                    engine_used: Engine::Primary,
                    fallback_triggered: true,
                })
            }
            Err(EngineError::Cancelled) => Err(EngineError::Cancelled),
            Err(fallback_error) => {
                tracing::error!(
                    secondary_error = %secondary_error,
                    fallback_error = %fallback_error,
                    "fallback engine also failed"
                );
                Err(EngineError::Composite {
                    secondary: Box::new(secondary_error),
                    fallback: Box::new(fallback_error),
                })
            }
        }
    }

    async fn call_primary(
        &self,
        prompt: &str,
        image: Option<&SourceImage>,
        options: &PrimaryOptions,
        cancel: &CancellationToken,
    ) -> Result<ImageHandle> {
        reliable_request(&self.retry, cancel, || {
            self.primary.generate(prompt, image, options)
        })
        .await
    }
}
