use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::dna::StyleDna;
use crate::mode::SynthesisMode;
use crate::tokens;

/// Subject used when the caller supplies only whitespace
pub const DEFAULT_SUBJECT: &str = "Modern subject";

/// Compile a prompt using the thread-local RNG for token selection.
pub fn compile(
    subject: &str,
    mode: SynthesisMode,
    dna: Option<&StyleDna>,
    extra_directives: Option<&str>,
    has_image: bool,
) -> String {
    compile_with_rng(subject, mode, dna, extra_directives, has_image, &mut rand::rng())
}

/// Compile a prompt with an explicit RNG.
///
/// Output is `<tok>, <tok>, <tok>, WORKFLOW: ...` followed by the optional
/// Style DNA block, the optional directives section, and the subject line,
/// each separated by a blank line.
pub fn compile_with_rng<R: Rng + ?Sized>(
    subject: &str,
    mode: SynthesisMode,
    dna: Option<&StyleDna>,
    extra_directives: Option<&str>,
    has_image: bool,
    rng: &mut R,
) -> String {
    let mut sections = vec![workflow_header(mode, has_image)];

    if let Some(dna) = dna {
        sections.push(dna_block(dna));
    }

    if let Some(directives) = extra_directives.filter(|d| !d.trim().is_empty()) {
        sections.push(format!("[DIRECTIVES]\n{directives}"));
    }

    let subject = match subject.trim() {
        "" => DEFAULT_SUBJECT,
        trimmed => trimmed,
    };
    sections.push(format!("SUBJECT: {subject}"));

    let prefix = tokens::pick(rng).join(", ");
    format!("{prefix}, {}", sections.join("\n\n"))
}

fn workflow_header(mode: SynthesisMode, has_image: bool) -> String {
    let (name, text) = match (mode, has_image) {
        (SynthesisMode::Vector, true) => (
            "VECTORIZE_SOURCE",
            "Trace the supplied image into flat vector shapes. Keep its composition and \
             silhouette, replace photographic texture with solid fills.",
        ),
        (SynthesisMode::Vector, false) => (
            "VECTOR_SYNTHESIS",
            "Build an original flat vector illustration of the subject. Bold saturated \
             colors, no gradients, simplified forms.",
        ),
        (SynthesisMode::Typography, true) => (
            "TYPOGRAPHIC_STYLE_TRANSFER",
            "Carry the lettering style of the supplied image onto the subject text. The \
             text is the artwork and must stay readable.",
        ),
        (SynthesisMode::Typography, false) => (
            "TYPOGRAPHIC_STYLE_TRANSFER",
            "Render the subject text as the artwork itself on a solid background. \
             Readability is mandatory.",
        ),
        (SynthesisMode::Monogram | SynthesisMode::Emblem, true) => (
            "SEAL_CONSTRUCTION",
            "Rebuild the supplied mark as a single contained seal. Preserve its layout \
             and fuse the letterforms by interlocking or stacking.",
        ),
        (SynthesisMode::Monogram | SynthesisMode::Emblem, false) => (
            "SEAL_CONSTRUCTION",
            "Construct a single contained identity seal. Fuse the letterforms by \
             interlocking or stacking, never side by side.",
        ),
    };

    format!("WORKFLOW: {name}. {text}")
}

fn dna_block(dna: &StyleDna) -> String {
    let p = dna.parameters;
    format!(
        "[STYLE_DNA domain={domain} name={name}]\n\
         LOCKED_PARAMETERS: threshold={:.2} smoothing={:.2} detail={:.2} edge={:.2}\n\
         PALETTE: {palette}\n\
         DESCRIPTION: {description}\n\
         TEMPLATE: {template}\n\
         [/STYLE_DNA]",
        p.threshold,
        p.smoothing,
        p.detail,
        p.edge,
        domain = dna.domain,
        name = dna.name,
        palette = dna.palette.join(", "),
        description = dna.description,
        template = dna.prompt_template,
    )
}

fn marker_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"WORKFLOW: [A-Z_]+\.[^\n]*", ""),
            (r"(?s)\[STYLE_DNA[^\n]*.*?\[/STYLE_DNA\]", ""),
            (r"\[DIRECTIVES\]", ""),
            (r"SUBJECT:", ""),
            (r"SYSTEM_MODE: \w+", ""),
            (r"\[DIRECTIVE:.*?\]", ""),
            (r"(?s)ARTISTIC_DNA:.*$", ""),
            (r"\s+", " "),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (
                Regex::new(pattern).expect("marker pattern must compile"),
                replacement,
            )
        })
        .collect()
    })
}

/// Strip compiler markers so a text-to-image model only sees descriptive text.
///
/// Removes the workflow header, any Style DNA block, section labels and
/// legacy directive markers, then collapses whitespace.
pub fn sanitize_for_text_engine(prompt: &str) -> String {
    let mut cleaned = prompt.to_owned();
    for (pattern, replacement) in marker_patterns() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }

    cleaned.trim().trim_end_matches(',').trim().to_owned()
}
