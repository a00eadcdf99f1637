//! Prompt compilation for image synthesis.
//!
//! Every synthesis prompt is `lock + DNA line + subject`, prefixed with three
//! randomly drawn design-fidelity tokens.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::style::ExtractionResult;

pub const EMPTY_SUBJECT: &str = "Abstract geometric synthesis.";

pub const VECTOR_LOCK: &str = "[PROTOCOL: GEOMETRIC_PRECISION_V5]
Execute synthesis with absolute mathematical rigor.
1. PRIMITIVES ONLY: Construct subjects using atomic geometric primitives (circles, triangles, rectangles).
2. STROKE PARITY: Maintain uniform line weights across the entire composition. No tapered strokes.
3. COLOR ISOLATION: Use flat, solid fills. Gradients are strictly forbidden.
4. SUBJECT PURITY: Isolate the primary subject against a 100% white or transparent background. No environmental noise.
5. SYMMETRY ENFORCEMENT: Prioritize radial or bilateral symmetry where applicable.
[OUTPUT]: High-contrast vector-style synthesis. Minimalist. Deterministic.";

pub const TYPOGRAPHY_LOCK: &str = "[PROTOCOL: GLYPH_SYNTAX_DECONSTRUCTION_URBAN_KINETIC]
Process alphabetic characters as dynamic, aggressive, and expressive forms, reflecting urban calligraphy and graffiti art.
1. KINETIC FLOW: Prioritize fluid, hand-drawn kinetics and intentional overlaps between glyphs.
2. STROKE VARIATION: Embrace varying stroke weights, sharp calligraphic terminals, and dynamic sweeps to convey energy.
3. NEGATIVE SPACE: Command the background as a solid, flat void, but allow for implied depth and motion through character placement.
4. SPRAY-PAINT AESTHETICS: Incorporate subtle hints of spray-paint texture or aggressive edge treatment if contextually relevant.
5. IMPACT APEX: Ensure the wordmark delivers raw, high-energy impact across various scales.
[OUTPUT]: High-contrast kinetic, urban, hand-styled wordmark. Expressive. Aggressive.";

pub const MONOGRAM_LOCK: &str = "[PROTOCOL: SEAL_SYNTHESIS_RADIAL]
Fuse character DNA into a single unified geometric seal.
1. INTERLOCKING LOGIC: Letters must share paths or interlock within a defined boundary.
2. BOUNDARY LOCK: The composition must fit within a primary geometric container (Circle, Hexagon, or Square).
3. SYMMETRY LATTICE: Enforce perfect radial symmetry across 2, 4, or 8 axes.
4. STROKE RATIO: Maintain a 1:1 ratio between stroke weight and inner negative space.
[OUTPUT]: Geometric signet/seal. Symmetric. Totemic.";

pub const FIDELITY_TOKENS: &[&str] = &[
    "mathematical precision, constructed geometry, vector-perfect curves, bezier path optimization",
    "minimalist geometric forms, Bauhaus-inspired composition, structural balance, architectural intent",
    "Swiss design principles, grid-based alignment, intentional white space, typographic hierarchy",
    "Constructivist geometric shapes, primary form deconstruction, solid fills, zero gradients",
    "uniform line weights, mono-weight strokes, geometric purity, mathematical tessellation",
    "high-contrast flat color palette, Pantone-accurate fills, solid opaque surfaces, zero textures",
    "minimalist visual hierarchy, legibility-first construction, clean isolated subject, mathematical kerning",
    "geometric abstraction, simplified silhouette, thick uniform outlines, iconic visual strength",
    "flat vector aesthetic, minimal detail for maximum impact, hard-edged shapes, crisp geometric borders",
    "monochrome high-contrast seal, symmetric geometric monogram, interlocked character geometry",
    "infinite scalability logic, vector-ready outlines, sharp geometric edges, mathematically defined paths",
    "clean subject isolation, white background purity, zero raster noise, zero artifacts",
    "geometric precision, modular construction, repeating geometric motifs, rhythmic symmetry",
];

const NAME_ADJECTIVES: &[&str] = &[
    "Zenith", "Vector", "Neural", "Cyber", "Void", "Omega", "Lattice", "Prism", "Aero", "Core", "Hyper", "Nova",
    "Flux", "Static", "Quantum",
];
const NAME_NOUNS: &[&str] = &[
    "Sigma", "Crest", "Splicer", "Matrix", "Engine", "Vortex", "Pulse", "Node", "Grid", "Fragment", "Axis", "Signet",
    "Vault", "Flow", "Unit",
];
const NAME_IDS: &[&str] = &["V1", "X", "Prime", "Delta", "Beta", "Alpha", "Pro"];

// =============================================================================
// SYNTHESIS MODE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Vector,
    Typography,
    Monogram,
}

impl SynthesisMode {
    #[must_use]
    pub fn lock(self) -> &'static str {
        match self {
            Self::Vector => VECTOR_LOCK,
            Self::Typography => TYPOGRAPHY_LOCK,
            Self::Monogram => MONOGRAM_LOCK,
        }
    }
}

// =============================================================================
// COMPILATION
// =============================================================================

/// Build the full synthesis prompt for `subject`.
#[must_use]
pub fn compile_visual_prompt(subject: &str, mode: SynthesisMode, dna: Option<&ExtractionResult>) -> String {
    inject_fidelity_tokens(&compose(subject, mode, dna), &mut rand::rng())
}

/// Deterministic part of [`compile_visual_prompt`].
fn compose(subject: &str, mode: SynthesisMode, dna: Option<&ExtractionResult>) -> String {
    let subject = match subject.trim() {
        "" => EMPTY_SUBJECT,
        s => s,
    };
    let dna_line = dna.map(dna_context).unwrap_or_default();
    format!("{}\n{dna_line}\n[VISUAL_SUBJECT]: {subject}", mode.lock())
}

fn dna_context(dna: &ExtractionResult) -> String {
    let palette = if dna.palette.is_empty() { "industrial".to_string() } else { dna.palette.join(", ") };
    format!(
        "[DNA_INJECTION]: Edge sharpness {}, Line smoothing {}, Color palette {palette}.",
        dna.parameters.edge, dna.parameters.smoothing
    )
}

/// Prefix `prompt` with three fidelity tokens drawn with replacement.
pub fn inject_fidelity_tokens(prompt: &str, rng: &mut impl Rng) -> String {
    let mut out = String::new();
    for _ in 0..3 {
        if let Some(token) = FIDELITY_TOKENS.choose(rng) {
            out.push_str(token);
            out.push_str(", ");
        }
    }
    out.push_str(prompt);
    out
}

/// Random fallback style name, e.g. `Prism-Vault Delta`.
#[must_use]
pub fn stylistic_name() -> String {
    let mut rng = rand::rng();
    let adj = pick(NAME_ADJECTIVES, &mut rng);
    let noun = pick(NAME_NOUNS, &mut rng);
    let id = pick(NAME_IDS, &mut rng);
    format!("{adj}-{noun} {id}")
}

fn pick(parts: &[&'static str], rng: &mut impl Rng) -> &'static str {
    parts.choose(rng).copied().unwrap_or_default()
}

// =============================================================================
// DATA URLS
// =============================================================================

/// Base64 payload of a data URL: everything after the first comma. `None`
/// when there is no comma or nothing follows it.
#[must_use]
pub fn pure_base64_data(data_url: &str) -> Option<&str> {
    data_url
        .split_once(',')
        .map(|(_, data)| data)
        .filter(|data| !data.is_empty())
}

#[must_use]
pub fn png_data_url(base64: &str) -> String {
    format!("data:image/png;base64,{base64}")
}

#[cfg(test)]
#[path = "prompt_test.rs"]
mod tests;
