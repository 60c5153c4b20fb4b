use serde::Serialize;

use crate::dna::StyleFeatures;
use crate::mode::SynthesisMode;

const STOP_WORDS: &[&str] = &["the", "and", "for", "with", "style", "design", "art", "image"];

/// Broad family an extracted style belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleCategory {
    Monogram,
    Typography,
    Emblem,
    /// Pixel-level effect, handled outside the generation engines
    Filter,
    Vector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleClassification {
    pub category: StyleCategory,
    /// `None` for filters, which no synthesis mode produces
    pub recommended_mode: Option<SynthesisMode>,
    /// Significant words from the description, lowercased
    pub keywords: Vec<String>,
}

impl StyleCategory {
    pub const fn recommended_mode(self) -> Option<SynthesisMode> {
        match self {
            Self::Monogram => Some(SynthesisMode::Monogram),
            Self::Typography => Some(SynthesisMode::Typography),
            Self::Emblem => Some(SynthesisMode::Emblem),
            Self::Vector => Some(SynthesisMode::Vector),
            Self::Filter => None,
        }
    }
}

/// Classify a style description using keyword heuristics.
///
/// Letter features win over description keywords: letters plus a monogram
/// cue yield `Monogram`, letters alone yield `Typography`.
pub fn classify(description: &str, features: Option<&StyleFeatures>) -> StyleClassification {
    let text = description.to_lowercase();
    let mentions = |cues: &[&str]| cues.iter().any(|cue| text.contains(cue));
    let has_letters = features.is_some_and(|f| f.has_letters);

    let category = if has_letters && mentions(&["monogram", "interlocked", "initial"]) {
        StyleCategory::Monogram
    } else if has_letters || mentions(&["typography", "text", "font"]) {
        StyleCategory::Typography
    } else if mentions(&["emblem", "crest", "shield", "badge"]) {
        StyleCategory::Emblem
    } else if mentions(&["filter", "effect", "spectral"]) {
        StyleCategory::Filter
    } else {
        StyleCategory::Vector
    };

    StyleClassification {
        category,
        recommended_mode: category.recommended_mode(),
        keywords: keywords(&text),
    }
}

fn keywords(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_owned)
        .collect()
}
