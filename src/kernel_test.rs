use super::test_helpers::{MockModel, image_response, mock_kernel, quota_error, text_response};
use super::*;
use crate::prompt::MONOGRAM_LOCK;
use serde_json::json;

fn first_text(request: &GenerateRequest) -> String {
    request.contents[0]
        .parts
        .iter()
        .find_map(|p| match p {
            Part::Text { text } => Some(text.clone()),
            _ => None,
        })
        .unwrap()
}

// =========================================================================
// PanelMode
// =========================================================================

#[test]
fn panel_mode_labels_are_lowercase() {
    assert_eq!(PanelMode::Extractor.as_str(), "extractor");
    assert_eq!(serde_json::to_value(PanelMode::Audit).unwrap(), json!("audit"));
}

#[test]
fn only_synthesis_panels_have_a_mode() {
    assert_eq!(PanelMode::Vector.synthesis_mode(), Some(SynthesisMode::Vector));
    assert_eq!(PanelMode::Monogram.synthesis_mode(), Some(SynthesisMode::Monogram));
    assert_eq!(PanelMode::Filters.synthesis_mode(), None);
    assert_eq!(PanelMode::Start.synthesis_mode(), None);
}

// =========================================================================
// chat
// =========================================================================

#[tokio::test]
async fn chat_maps_history_and_enables_search() {
    let mut reply = text_response("LATTICE_OK");
    reply.sources = vec![GroundingSource { title: "Docs".into(), uri: "https://example.com".into() }];
    let model = Arc::new(MockModel::new(vec![Ok(reply)]));
    let kernel = mock_kernel(model.clone());

    let history = vec![
        ChatTurn { role: ChatRole::User, content: "status?".into() },
        ChatTurn { role: ChatRole::Model, content: "nominal".into() },
        ChatTurn { role: ChatRole::User, content: "report".into() },
    ];
    let config = KernelConfig { temperature: 0.4, ..KernelConfig::default() };
    let out = kernel.chat(&history, &config).await.unwrap();

    assert_eq!(out.text, "LATTICE_OK");
    assert_eq!(out.sources.len(), 1);

    let (name, request) = model.call(0);
    assert_eq!(name, config.model);
    let roles: Vec<_> = request.contents.iter().map(|c| c.role.clone().unwrap()).collect();
    assert_eq!(roles, vec!["user", "model", "user"]);
    assert_eq!(request.tools, vec![json!({ "googleSearch": {} })]);
    assert_eq!(request.generation_config.temperature, Some(0.4));
    assert!(request.system_instruction.is_some());
}

#[tokio::test]
async fn chat_without_text_answers_protocol_null() {
    let model = Arc::new(MockModel::new(vec![Ok(GenerateResponse::default())]));
    let kernel = mock_kernel(model);
    let out = kernel.chat(&[], &KernelConfig::default()).await.unwrap();
    assert_eq!(out.text, EMPTY_REPLY);
    assert!(out.sources.is_empty());
}

#[tokio::test]
async fn chat_recovers_from_quota() {
    let model = Arc::new(MockModel::new(vec![Err(quota_error()), Err(quota_error()), Ok(text_response("back"))]));
    let kernel = mock_kernel(model.clone());
    let out = kernel.chat(&[], &KernelConfig::default()).await.unwrap();
    assert_eq!(out.text, "back");
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn fatal_error_is_not_retried() {
    let model = Arc::new(MockModel::new(vec![Err(LlmError::ApiResponse { status: 400, body: "bad request".into() })]));
    let kernel = mock_kernel(model.clone());
    let err = kernel.chat(&[], &KernelConfig::default()).await.unwrap_err();
    assert!(matches!(err, LlmError::ApiResponse { status: 400, .. }));
    assert_eq!(model.call_count(), 1);
}

// =========================================================================
// extract_style
// =========================================================================

#[tokio::test]
async fn extract_rejects_empty_buffer_without_calling_model() {
    let model = Arc::new(MockModel::default());
    let kernel = mock_kernel(model.clone());
    let err = kernel
        .extract_style("data:image/jpeg;base64,", &KernelConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::EmptyBuffer));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn extract_sends_image_schema_and_budget() {
    let body = json!({
        "domain": "Monogram",
        "category": "Heraldic Seal",
        "name": "Core-Signet Prime",
        "description": "Radial interlock",
        "confidence": 0.8,
        "styleAuthenticityScore": 91,
        "palette": ["#111111"],
        "parameters": { "threshold": 60, "smoothing": 30, "detail": 70, "edge": 85 }
    });
    let model = Arc::new(MockModel::new(vec![Ok(text_response(&body.to_string()))]));
    let kernel = mock_kernel(model.clone());
    let config = KernelConfig { thinking_budget: 512, ..KernelConfig::default() };

    let result = kernel
        .extract_style("data:image/jpeg;base64,QUJD", &config)
        .await
        .unwrap();
    assert_eq!(result.name, "Core-Signet Prime");
    assert!(result.is_authentic());

    let (_, request) = model.call(0);
    match &request.contents[0].parts[0] {
        Part::InlineData { inline_data } => {
            assert_eq!(inline_data.data, "QUJD");
            assert_eq!(inline_data.mime_type, "image/jpeg");
        }
        other => panic!("expected image part first, got {other:?}"),
    }
    let gen_config = &request.generation_config;
    assert_eq!(gen_config.response_mime_type.as_deref(), Some("application/json"));
    assert_eq!(gen_config.response_schema, Some(extraction_schema()));
    assert_eq!(gen_config.thinking_config, Some(ThinkingConfig { thinking_budget: 512 }));
}

#[tokio::test]
async fn extract_empty_answer_yields_defaults() {
    let model = Arc::new(MockModel::new(vec![Ok(GenerateResponse::default())]));
    let kernel = mock_kernel(model);
    let result = kernel
        .extract_style("data:image/jpeg;base64,QUJD", &KernelConfig::default())
        .await
        .unwrap();
    assert_eq!(result.category, crate::style::DEFAULT_CATEGORY);
    assert!(!result.is_authentic());
}

#[tokio::test]
async fn extract_malformed_json_is_parse_error() {
    let model = Arc::new(MockModel::new(vec![Ok(text_response("not json {"))]));
    let kernel = mock_kernel(model);
    let err = kernel
        .extract_style("data:image/jpeg;base64,QUJD", &KernelConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

// =========================================================================
// synthesize
// =========================================================================

#[tokio::test]
async fn synthesize_flash_returns_png_data_url() {
    let model = Arc::new(MockModel::new(vec![Ok(image_response("UE5H"))]));
    let kernel = mock_kernel(model.clone());
    let url = kernel
        .synthesize_vector("fox", None, &KernelConfig::default(), None)
        .await
        .unwrap();
    assert_eq!(url, "data:image/png;base64,UE5H");

    let (name, request) = model.call(0);
    assert_eq!(name, FLASH_IMAGE_MODEL);
    assert_eq!(request.contents[0].parts.len(), 1);
    assert_eq!(request.generation_config.temperature, Some(0.1));
    assert!(request.generation_config.image_config.is_none());
}

#[tokio::test]
async fn synthesize_pro_seeds_with_reference_image() {
    let model = Arc::new(MockModel::new(vec![Ok(image_response("UE5H"))]));
    let kernel = mock_kernel(model.clone());
    let config = KernelConfig { use_pro_model: true, ..KernelConfig::default() };
    kernel
        .synthesize_typography("AXIS", Some("data:image/jpeg;base64,SU1H"), &config, None)
        .await
        .unwrap();

    let (name, request) = model.call(0);
    assert_eq!(name, PRO_IMAGE_MODEL);
    assert!(matches!(&request.contents[0].parts[0], Part::InlineData { inline_data } if inline_data.data == "SU1H"));
    assert_eq!(
        request.generation_config.image_config,
        Some(ImageConfig { aspect_ratio: "1:1".into(), image_size: "2K".into() })
    );
}

#[tokio::test]
async fn synthesize_monogram_uses_seal_lock() {
    let model = Arc::new(MockModel::new(vec![Ok(image_response("UE5H"))]));
    let kernel = mock_kernel(model.clone());
    kernel
        .synthesize_monogram("AB", None, &KernelConfig::default(), None)
        .await
        .unwrap();
    let (_, request) = model.call(0);
    let text = first_text(&request);
    assert!(text.contains(MONOGRAM_LOCK));
    assert!(text.ends_with("[VISUAL_SUBJECT]: AB"));
}

#[tokio::test]
async fn synthesize_without_image_part_fails() {
    let model = Arc::new(MockModel::new(vec![Ok(text_response("I cannot draw that"))]));
    let kernel = mock_kernel(model.clone());
    let err = kernel
        .synthesize_vector("fox", None, &KernelConfig::default(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::NoImageOutput));
    assert_eq!(model.call_count(), 1);
}

// =========================================================================
// refine_prompt
// =========================================================================

#[tokio::test]
async fn refine_returns_model_text() {
    let model = Arc::new(MockModel::new(vec![Ok(text_response("a crisp geometric fox"))]));
    let kernel = mock_kernel(model.clone());
    let out = kernel
        .refine_prompt("fox", PanelMode::Vector, &KernelConfig::default(), None)
        .await
        .unwrap();
    assert_eq!(out, "a crisp geometric fox");

    let (_, request) = model.call(0);
    assert_eq!(request.generation_config.temperature, Some(0.7));
    let text = first_text(&request);
    assert!(text.contains("in vector mode"));
    assert!(text.contains("DNA Context: {}"));
}

#[tokio::test]
async fn refine_falls_back_to_original_prompt() {
    let model = Arc::new(MockModel::new(vec![Ok(GenerateResponse::default())]));
    let kernel = mock_kernel(model);
    let out = kernel
        .refine_prompt("fox", PanelMode::Monogram, &KernelConfig::default(), None)
        .await
        .unwrap();
    assert_eq!(out, "fox");
}

#[tokio::test]
async fn refine_embeds_dna_json() {
    let dna = ExtractionResult::from_model_json(&json!({ "name": "Flux-Node V1" }));
    let model = Arc::new(MockModel::new(vec![Ok(text_response("ok"))]));
    let kernel = mock_kernel(model.clone());
    kernel
        .refine_prompt("fox", PanelMode::Typography, &KernelConfig::default(), Some(&dna))
        .await
        .unwrap();
    let (_, request) = model.call(0);
    assert!(first_text(&request).contains("\"name\":\"Flux-Node V1\""));
}

// =========================================================================
// analyze_code
// =========================================================================

#[tokio::test]
async fn analyze_code_parses_issues() {
    let issues = json!([{
        "id": "css-1",
        "type": "CSS",
        "severity": "HIGH",
        "title": "Fixed width",
        "description": "Container overflows on mobile",
        "file": "App.tsx",
        "line": 12,
        "codeSnippet": "width: 1200px",
        "fix": "max-width: 100%",
        "fixed": false,
        "canAutoFix": true,
        "timestamp": 1_700_000_000_000_i64,
        "impact": "VISUAL"
    }]);
    let model = Arc::new(MockModel::new(vec![Ok(text_response(&issues.to_string()))]));
    let kernel = mock_kernel(model.clone());

    let out = kernel.analyze_code("<div/>").await.unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, IssueKind::Css);
    assert_eq!(out[0].severity, Severity::High);
    assert_eq!(out[0].line, Some(12));
    assert!(out[0].can_auto_fix);

    let (name, request) = model.call(0);
    assert_eq!(name, CODE_REVIEW_MODEL);
    assert_eq!(request.generation_config.response_mime_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn analyze_code_empty_answer_is_no_issues() {
    let model = Arc::new(MockModel::new(vec![Ok(GenerateResponse::default())]));
    let kernel = mock_kernel(model);
    assert!(kernel.analyze_code("fn main() {}").await.unwrap().is_empty());
}

#[tokio::test]
async fn analyze_code_wrong_shape_is_parse_error() {
    let model = Arc::new(MockModel::new(vec![Ok(text_response(r#"{"issues": []}"#))]));
    let kernel = mock_kernel(model);
    let err = kernel.analyze_code("x").await.unwrap_err();
    assert!(matches!(err, LlmError::ApiParse(_)));
}

// =========================================================================
// from_config
// =========================================================================

#[test]
fn from_config_builds_gemini_kernel() {
    let config = Config {
        api_key_var: "API_KEY".into(),
        api_key: "k".into(),
        base_url: "http://localhost:1".into(),
        timeouts: crate::config::LlmTimeouts::default(),
        kernel: KernelConfig::default(),
        retry: crate::reliability::RetryPolicy::default(),
    };
    let kernel = Kernel::from_config(&config).unwrap();
    assert_eq!(kernel.reliable.policy(), config.retry);
}
