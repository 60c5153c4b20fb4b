//! Vision bridge for engines that cannot read images
//!
//! The primary engine describes the reference image and the description is
//! folded into the text prompt. Analysis failures degrade to a note in the
//! prompt instead of failing the request.

use hyperxgen_config::Engine;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Result};
use crate::provider::{PrimaryEngine, PrimaryOptions};
use crate::retry::{RetryPolicy, reliable_request};
use crate::types::SourceImage;

const ANALYSIS_FAILED_NOTE: &str =
    "Note: reference image analysis failed, rely on the text description alone.";

/// Describe `image` with the primary engine.
///
/// Returns `Ok(None)` when the analysis fails; only cancellation is an error.
pub async fn describe_reference(
    primary: &dyn PrimaryEngine,
    image: &SourceImage,
    retry: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Option<String>> {
    let options = PrimaryOptions::default();
    let described = reliable_request(retry, cancel, || primary.describe_image(image, &options)).await;

    match described {
        Ok(description) => Ok(Some(description)),
        Err(EngineError::Cancelled) => Err(EngineError::Cancelled),
        Err(e) => {
            tracing::warn!(
                engine = %Engine::Primary,
                error = %e,
                "image analysis failed, continuing without visual reference"
            );
            Ok(None)
        }
    }
}

/// Fold an optional image description into a sanitized prompt
pub fn bridged_prompt(description: Option<&str>, prompt: &str) -> String {
    match description {
        Some(description) => format!(
            "Visual Reference: {}. Style: {prompt}. Ensure perfect structural alignment.",
            description.trim().trim_end_matches('.')
        ),
        None => format!("{prompt}. {ANALYSIS_FAILED_NOTE}"),
    }
}
