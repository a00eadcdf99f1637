use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

fn dna() -> ExtractionResult {
    ExtractionResult::from_model_json(&json!({
        "name": "Nova-Grid X",
        "palette": ["#000000", "#FABD0D"],
        "parameters": { "threshold": 10, "smoothing": 25, "detail": 40, "edge": 90 }
    }))
}

#[test]
fn compose_uses_mode_lock_and_subject() {
    let prompt = compose("a fox", SynthesisMode::Monogram, None);
    assert!(prompt.starts_with(MONOGRAM_LOCK));
    assert!(prompt.ends_with("[VISUAL_SUBJECT]: a fox"));
    assert!(!prompt.contains("[DNA_INJECTION]"));
}

#[test]
fn compose_blank_subject_falls_back() {
    let prompt = compose("   ", SynthesisMode::Vector, None);
    assert!(prompt.ends_with(EMPTY_SUBJECT));
}

#[test]
fn compose_injects_dna_line() {
    let prompt = compose("crest", SynthesisMode::Typography, Some(&dna()));
    assert!(prompt.contains("[DNA_INJECTION]: Edge sharpness 90, Line smoothing 25, Color palette #000000, #FABD0D."));
}

#[test]
fn compose_empty_palette_reads_industrial() {
    let bare = ExtractionResult::from_model_json(&json!({}));
    let prompt = compose("crest", SynthesisMode::Vector, Some(&bare));
    assert!(prompt.contains("Edge sharpness 50, Line smoothing 50, Color palette industrial."));
}

#[test]
fn fidelity_tokens_prefix_prompt() {
    let mut rng = StdRng::seed_from_u64(7);
    let out = inject_fidelity_tokens("SUBJECT", &mut rng);
    assert!(out.ends_with(", SUBJECT"));
    let prefix = out.trim_end_matches("SUBJECT");
    let hits = FIDELITY_TOKENS.iter().filter(|t| prefix.contains(*t)).count();
    assert!((1..=3).contains(&hits), "expected up to three tokens, found {hits}");
}

#[test]
fn compiled_prompt_contains_lock_after_tokens() {
    let out = compile_visual_prompt("seal", SynthesisMode::Monogram, None);
    assert!(out.contains(MONOGRAM_LOCK));
    assert!(!out.starts_with(MONOGRAM_LOCK));
}

#[test]
fn stylistic_name_has_three_parts() {
    let name = stylistic_name();
    let (head, id) = name.split_once(' ').unwrap();
    let (adj, noun) = head.split_once('-').unwrap();
    assert!(NAME_ADJECTIVES.contains(&adj));
    assert!(NAME_NOUNS.contains(&noun));
    assert!(NAME_IDS.contains(&id));
}

#[test]
fn pure_base64_strips_header() {
    assert_eq!(pure_base64_data("data:image/jpeg;base64,QUJD"), Some("QUJD"));
}

#[test]
fn pure_base64_rejects_missing_or_empty_payload() {
    assert_eq!(pure_base64_data("QUJD"), None);
    assert_eq!(pure_base64_data("data:image/png;base64,"), None);
    assert_eq!(pure_base64_data(""), None);
}

#[test]
fn png_data_url_prefix() {
    assert_eq!(png_data_url("QUJD"), "data:image/png;base64,QUJD");
}
