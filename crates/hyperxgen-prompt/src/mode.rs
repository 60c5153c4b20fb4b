use serde::{Deserialize, Serialize};

/// Synthesis module a prompt is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// Flat vector marks and illustrations
    Vector,
    /// Lettering where the word is the artwork
    Typography,
    /// Interlocked initials
    Monogram,
    /// Shield-contained crests with layered text
    Emblem,
}

impl SynthesisMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Typography => "typography",
            Self::Monogram => "monogram",
            Self::Emblem => "emblem",
        }
    }
}
