use rand::Rng;
use rand::seq::IndexedRandom;

/// Number of fidelity tokens prepended to every compiled prompt
pub const TOKENS_PER_PROMPT: usize = 3;

/// Quality and safety phrases steering engines toward clean vector output
///
/// Entries never contain commas so the prefix splits cleanly on `", "`.
pub const FIDELITY_TOKENS: &[&str] = &[
    "strictly flat vector illustration",
    "crisp geometric edges",
    "solid flat color fills",
    "intentional negative space",
    "bold graphic silhouette",
    "high contrast palette",
    "professional brand identity work",
    "clean scalable shapes",
    "abstract stylized forms",
    "safe for work design",
    "minimal line economy",
    "balanced visual weight",
];

/// Picks distinct tokens from the pool in random order.
pub(crate) fn pick<R: Rng + ?Sized>(rng: &mut R) -> Vec<&'static str> {
    FIDELITY_TOKENS
        .choose_multiple(rng, TOKENS_PER_PROMPT)
        .copied()
        .collect()
}
