use std::fmt;

use serde::{Deserialize, Serialize};

/// Design domain a Style DNA was extracted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StyleDomain {
    Vector,
    Typography,
    Monogram,
}

impl fmt::Display for StyleDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vector => "VECTOR",
            Self::Typography => "TYPOGRAPHY",
            Self::Monogram => "MONOGRAM",
        })
    }
}

/// Numeric trace parameters locked by an extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleParameters {
    pub threshold: f32,
    pub smoothing: f32,
    pub detail: f32,
    pub edge: f32,
}

/// Boolean traits detected in the reference image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFeatures {
    pub has_letters: bool,
    pub is_geometric: bool,
    pub is_abstract: bool,
    pub has_symmetry: bool,
    pub uses_negative_space: bool,
    pub stroke_based: bool,
    pub color_based: bool,
    pub texture_based: bool,
}

/// Visual parameters extracted from a reference image
///
/// Produced by an external extraction step and passed through unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDna {
    pub domain: StyleDomain,
    /// Trait-based label, e.g. `NEON_GLITCH_VECTOR`
    #[serde(default)]
    pub name: String,
    /// Ordered palette, usually hex strings
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub parameters: StyleParameters,
    /// Subject-agnostic style phrase reusable on any new subject
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<StyleFeatures>,
}
