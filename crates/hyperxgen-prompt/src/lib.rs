//! Prompt construction for the HyperXGen generation engines
//!
//! Turns a subject, a synthesis mode, and optional Style DNA into the
//! composite instruction sent to the engines.

#![allow(clippy::must_use_candidate)]

mod classify;
mod compiler;
mod dna;
mod mode;
mod tokens;

pub use classify::{StyleCategory, StyleClassification, classify};
pub use compiler::{DEFAULT_SUBJECT, compile, compile_with_rng, sanitize_for_text_engine};
pub use dna::{StyleDna, StyleDomain, StyleFeatures, StyleParameters};
pub use mode::SynthesisMode;
pub use tokens::{FIDELITY_TOKENS, TOKENS_PER_PROMPT};
