//! Generation orchestration for HyperXGen
//!
//! Two engines sit behind [`Orchestrator`]: a multimodal primary engine that
//! accepts reference images, and a text-only secondary engine on a hosted
//! inference API. Secondary failures of an infrastructure kind fall back to
//! the primary engine once.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod bridge;
mod error;
mod orchestrator;
mod protocol;
mod provider;
mod retry;
mod types;

pub use error::{EngineError, Result};
pub use hyperxgen_config::Engine;
pub use orchestrator::Orchestrator;
pub use provider::gemini::{GeminiEngine, validate_model_access};
pub use provider::inference::{AssumeOnline, Connectivity, InferenceEngine, InferenceParameters};
pub use provider::{PrimaryEngine, PrimaryOptions, SecondaryEngine, SecondaryOptions};
pub use retry::{RetryPolicy, RetryableError, reliable_request};
pub use types::{EngineConfig, GenerationRequest, GenerationResult, ImageHandle, SourceImage};
