use hyperxgen_config::Engine;
use thiserror::Error;

use crate::retry::RetryableError;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Generation failures, classified at the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    /// Credentials missing, placeholder, or rejected upstream
    #[error("{engine} engine authentication failed: {message}")]
    Auth { engine: Engine, message: String },

    /// Rate limit or quota exhausted
    #[error("{engine} engine quota exhausted: {message}")]
    Quota { engine: Engine, message: String },

    /// Secondary model kept reporting that it is still loading
    #[error("secondary engine model did not finish loading after {attempts} attempts")]
    ColdStartTimeout { attempts: u32 },

    /// Request never reached the backend
    #[error("{engine} engine unreachable: {message}")]
    NetworkBlocked { engine: Engine, message: String },

    /// Unexpected upstream status or error payload
    #[error("{engine} engine returned HTTP {status}: {body}")]
    Gateway {
        engine: Engine,
        status: u16,
        body: String,
    },

    /// Backend answered without producing an image
    #[error("{engine} engine refused the request: {message}")]
    SafetyRefusal { engine: Engine, message: String },

    /// Model family not permitted for this engine
    #[error("model `{model}` is not available on the {engine} engine")]
    ModelAccessDenied { engine: Engine, model: String },

    /// Response body could not be decoded
    #[error("{engine} engine returned an unreadable response: {message}")]
    InvalidResponse { engine: Engine, message: String },

    /// Source image was not valid base64 or a data URL
    #[error("invalid source image: {0}")]
    InvalidImage(String),

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Secondary failed and the primary fallback failed too
    #[error("{}", composite_message(.secondary, .fallback))]
    Composite {
        secondary: Box<EngineError>,
        fallback: Box<EngineError>,
    },
}

impl EngineError {
    /// Whether a secondary failure of this kind should fall back to the primary engine
    pub const fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Self::Auth { .. }
                | Self::Quota { .. }
                | Self::ColdStartTimeout { .. }
                | Self::NetworkBlocked { .. }
                | Self::Gateway { .. }
        )
    }

    /// Engine the failure originated from
    pub fn engine(&self) -> Option<Engine> {
        match self {
            Self::Auth { engine, .. }
            | Self::Quota { engine, .. }
            | Self::NetworkBlocked { engine, .. }
            | Self::Gateway { engine, .. }
            | Self::SafetyRefusal { engine, .. }
            | Self::ModelAccessDenied { engine, .. }
            | Self::InvalidResponse { engine, .. } => Some(*engine),
            Self::ColdStartTimeout { .. } => Some(Engine::Secondary),
            Self::Composite { fallback, .. } => fallback.engine(),
            Self::InvalidImage(_) | Self::Cancelled => None,
        }
    }
}

impl RetryableError for EngineError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Quota { .. })
    }

    fn cancelled() -> Self {
        Self::Cancelled
    }
}

fn composite_message(secondary: &EngineError, fallback: &EngineError) -> String {
    if matches!(fallback, EngineError::Quota { .. }) {
        format!("{secondary}. Fallback to the primary engine also ran out of quota")
    } else {
        format!("critical: both engines failed. secondary: {secondary}; primary fallback: {fallback}")
    }
}
