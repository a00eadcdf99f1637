//! Kernel — the generation operations panels call.
//!
//! DESIGN
//! ======
//! Each operation builds one `generateContent` request and sends it through
//! [`ReliableRequest`], so quota and credential failures are absorbed here
//! and only fatal errors reach the panel. Response post-processing (image
//! extraction, JSON decoding) happens after the reliable call; its failures
//! are never retryable anyway.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Config, KernelConfig};
use crate::llm::types::{
    Content, GenerateRequest, GenerateResponse, GenerativeModel, GroundingSource, ImageConfig, LlmError, Part,
    ThinkingConfig,
};
use crate::llm::{Credentials, EnvCredentialRecovery, GeminiClient};
use crate::prompt::{SynthesisMode, compile_visual_prompt, png_data_url, pure_base64_data};
use crate::reliability::ReliableRequest;
use crate::style::{ExtractionResult, extraction_schema};

pub const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const PRO_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";
pub const CODE_REVIEW_MODEL: &str = "gemini-3-pro-preview";

/// Chat reply text when the model returns nothing.
pub const EMPTY_REPLY: &str = "PROTOCOL_NULL";

const BASE_SYSTEM_DIRECTIVE: &str = "You are a high-density computation and design analysis engine.
All operations must be geometric, precise, and deterministic.
Maintain absolute architectural consistency across the lattice.";

const IMAGE_SYSTEM_DIRECTIVE: &str = "You are a specialized image generation engine focused on geometric purity and industrial precision.
1. STRICT VISUAL ONLY: Render the visual geometry described. Do not include any text, labels, or metadata.
2. HIGH CONTRAST: Prioritize sharp edges and mathematical accuracy.";

const EXTRACTION_PROMPT: &str = "Perform a forensic style extraction on the provided image. Analyze and distill its core design DNA.
1. Dominant domain: Vector, Typography, or Monogram.
2. Category and a high-concept name for this style.
3. A hyper-condensed description of the validated attributes.
4. Visual parameters on 0-100: threshold (contrast), smoothing (curves vs. angles), detail (intricacy), edge (sharpness).
5. The most prominent hexadecimal colors.
6. A 0-100 authenticity score for adherence to the detected style.
Return the analysis strictly as a JSON object matching the schema.";

const IMAGE_TEMPERATURE: f32 = 0.1;
const REFINE_TEMPERATURE: f32 = 0.7;

// =============================================================================
// TYPES
// =============================================================================

/// Which panel an operation was issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelMode {
    Start,
    Vector,
    Typography,
    Monogram,
    Extractor,
    Filters,
    Audit,
}

impl PanelMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Vector => "vector",
            Self::Typography => "typography",
            Self::Monogram => "monogram",
            Self::Extractor => "extractor",
            Self::Filters => "filters",
            Self::Audit => "audit",
        }
    }

    /// Synthesis mode for panels that generate images.
    #[must_use]
    pub fn synthesis_mode(self) -> Option<SynthesisMode> {
        match self {
            Self::Vector => Some(SynthesisMode::Vector),
            Self::Typography => Some(SynthesisMode::Typography),
            Self::Monogram => Some(SynthesisMode::Monogram),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    #[serde(rename = "CSS")]
    Css,
    Accessibility,
    Performance,
    TypeScript,
    React,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Visual,
    Performance,
    Accessibility,
    Maintainability,
}

/// One code refinement finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealIssue {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub code_snippet: String,
    pub fix: String,
    pub fixed: bool,
    pub can_auto_fix: bool,
    pub timestamp: i64,
    pub impact: Impact,
}

// =============================================================================
// KERNEL
// =============================================================================

#[derive(Clone)]
pub struct Kernel {
    model: Arc<dyn GenerativeModel>,
    reliable: ReliableRequest,
}

impl Kernel {
    #[must_use]
    pub fn new(model: Arc<dyn GenerativeModel>, reliable: ReliableRequest) -> Self {
        Self { model, reliable }
    }

    /// Build a Gemini-backed kernel from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(&Config::from_env()?)
    }

    /// Build a Gemini-backed kernel whose credential recovery re-reads the
    /// configured key variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let credentials = Credentials::new(config.api_key.clone());
        let client = GeminiClient::new(credentials.clone(), &config.base_url, config.timeouts)?;
        let recovery = EnvCredentialRecovery::new(config.api_key_var.clone(), credentials);
        info!(model = %config.kernel.model, base_url = %config.base_url, "kernel initialized");
        Ok(Self::new(Arc::new(client), ReliableRequest::new(config.retry, Arc::new(recovery))))
    }

    async fn send(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.reliable
            .run(|| self.model.generate(model, request))
            .await
    }

    /// Grounded chat with the kernel operator persona.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when the call fails after recovery.
    pub async fn chat(&self, history: &[ChatTurn], config: &KernelConfig) -> Result<ChatReply, LlmError> {
        let contents = history
            .iter()
            .map(|turn| Content {
                role: Some(
                    match turn.role {
                        ChatRole::User => "user",
                        ChatRole::Model => "model",
                    }
                    .to_string(),
                ),
                parts: vec![Part::text(&turn.content)],
            })
            .collect();

        let mut request = GenerateRequest::new(contents).system(format!(
            "{BASE_SYSTEM_DIRECTIVE}\nROLE: KERNEL_OPERATOR. Communicate with architectural precision."
        ));
        request.generation_config.temperature = Some(config.temperature);
        request.tools = vec![serde_json::json!({ "googleSearch": {} })];

        debug!(turns = history.len(), device = %config.device_context, "kernel chat");
        let response = self.send(&config.model, &request).await?;
        Ok(ChatReply {
            text: response.text().unwrap_or_else(|| EMPTY_REPLY.to_string()),
            sources: response.sources,
        })
    }

    /// Extract a style profile from an image data URL.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::EmptyBuffer`] when the data URL has no payload, and
    /// [`LlmError::ApiParse`] when the model's JSON cannot be decoded.
    pub async fn extract_style(&self, image: &str, config: &KernelConfig) -> Result<ExtractionResult, LlmError> {
        let data = pure_base64_data(image).ok_or(LlmError::EmptyBuffer)?;

        let mut request = GenerateRequest::new(vec![Content::user(vec![Part::jpeg(data), Part::text(EXTRACTION_PROMPT)])])
            .system(format!(
                "{BASE_SYSTEM_DIRECTIVE}\nROLE: FORENSIC_STYLE_AUTHENTICATOR. Focus on uncompromising fidelity to identified style principles."
            ));
        request.generation_config.response_mime_type = Some("application/json".into());
        request.generation_config.response_schema = Some(extraction_schema());
        request.generation_config.thinking_config = Some(ThinkingConfig { thinking_budget: config.thinking_budget });

        let response = self.send(&config.model, &request).await?;
        let raw = parse_json_text(response.text().as_deref(), "{}")?;
        let result = ExtractionResult::from_model_json(&raw);
        info!(name = %result.name, score = result.style_authenticity_score, "style extracted");
        Ok(result)
    }

    /// Render `prompt` in `mode`, optionally seeded by a reference image and
    /// biased by a style profile. Returns a PNG data URL.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NoImageOutput`] when the model answers without an image.
    pub async fn synthesize(
        &self,
        mode: SynthesisMode,
        prompt: &str,
        image: Option<&str>,
        config: &KernelConfig,
        dna: Option<&ExtractionResult>,
    ) -> Result<String, LlmError> {
        let model = if config.use_pro_model { PRO_IMAGE_MODEL } else { FLASH_IMAGE_MODEL };

        let mut parts = Vec::with_capacity(2);
        if let Some(data) = image.and_then(pure_base64_data) {
            parts.push(Part::jpeg(data));
        }
        parts.push(Part::text(compile_visual_prompt(prompt, mode, dna)));

        let mut request = GenerateRequest::new(vec![Content::user(parts)]).system(IMAGE_SYSTEM_DIRECTIVE);
        request.generation_config.temperature = Some(IMAGE_TEMPERATURE);
        if config.use_pro_model {
            request.generation_config.image_config =
                Some(ImageConfig { aspect_ratio: "1:1".into(), image_size: "2K".into() });
        }

        debug!(?mode, model, seeded = image.is_some(), "synthesis request");
        let response = self.send(model, &request).await?;
        response
            .inline_data()
            .map(|inline| png_data_url(&inline.data))
            .ok_or(LlmError::NoImageOutput)
    }

    /// # Errors
    ///
    /// See [`Kernel::synthesize`].
    pub async fn synthesize_vector(
        &self,
        prompt: &str,
        image: Option<&str>,
        config: &KernelConfig,
        dna: Option<&ExtractionResult>,
    ) -> Result<String, LlmError> {
        self.synthesize(SynthesisMode::Vector, prompt, image, config, dna).await
    }

    /// # Errors
    ///
    /// See [`Kernel::synthesize`].
    pub async fn synthesize_typography(
        &self,
        prompt: &str,
        image: Option<&str>,
        config: &KernelConfig,
        dna: Option<&ExtractionResult>,
    ) -> Result<String, LlmError> {
        self.synthesize(SynthesisMode::Typography, prompt, image, config, dna).await
    }

    /// # Errors
    ///
    /// See [`Kernel::synthesize`].
    pub async fn synthesize_monogram(
        &self,
        prompt: &str,
        image: Option<&str>,
        config: &KernelConfig,
        dna: Option<&ExtractionResult>,
    ) -> Result<String, LlmError> {
        self.synthesize(SynthesisMode::Monogram, prompt, image, config, dna).await
    }

    /// Ask the model to rewrite a prompt for `mode`. Falls back to the
    /// original prompt when the model returns no text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when the call fails after recovery.
    pub async fn refine_prompt(
        &self,
        prompt: &str,
        mode: PanelMode,
        config: &KernelConfig,
        dna: Option<&ExtractionResult>,
    ) -> Result<String, LlmError> {
        let dna_json = dna
            .and_then(|d| serde_json::to_string(d).ok())
            .unwrap_or_else(|| "{}".to_string());
        let text = format!(
            "Refine this prompt for better image generation in {} mode. Prompt: \"{prompt}\". DNA Context: {dna_json}. Return ONLY the refined prompt.",
            mode.as_str()
        );

        let mut request = GenerateRequest::new(vec![Content::user(vec![Part::text(text)])])
            .system("You are a prompt engineer for high-end design AI.");
        request.generation_config.temperature = Some(REFINE_TEMPERATURE);

        let response = self.send(&config.model, &request).await?;
        Ok(response.text().unwrap_or_else(|| prompt.to_string()))
    }

    /// Review `code` and return refinement findings.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ApiParse`] when the findings do not match [`RealIssue`].
    pub async fn analyze_code(&self, code: &str) -> Result<Vec<RealIssue>, LlmError> {
        let text = format!("Analyze the following code for refinements. Output a JSON array of RealIssue objects.\n\nCODE:\n{code}");
        let mut request = GenerateRequest::new(vec![Content::user(vec![Part::text(text)])])
            .system("You are a senior frontend architect.");
        request.generation_config.response_mime_type = Some("application/json".into());
        request.generation_config.response_schema = Some(issue_schema());

        let response = self.send(CODE_REVIEW_MODEL, &request).await?;
        let raw = parse_json_text(response.text().as_deref(), "[]")?;
        serde_json::from_value(raw).map_err(|e| LlmError::ApiParse(e.to_string()))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn parse_json_text(text: Option<&str>, empty: &str) -> Result<Value, LlmError> {
    serde_json::from_str(text.unwrap_or(empty)).map_err(|e| LlmError::ApiParse(e.to_string()))
}

fn issue_schema() -> Value {
    let string = serde_json::json!({ "type": "STRING" });
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": string,
                "type": string,
                "severity": string,
                "title": string,
                "description": string,
                "file": string,
                "line": { "type": "NUMBER" },
                "codeSnippet": string,
                "fix": string,
                "fixed": { "type": "BOOLEAN" },
                "canAutoFix": { "type": "BOOLEAN" },
                "timestamp": { "type": "NUMBER" },
                "impact": string
            },
            "required": [
                "id", "type", "severity", "title", "description", "file", "codeSnippet",
                "fix", "fixed", "canAutoFix", "timestamp", "impact"
            ]
        }
    })
}


#[cfg(test)]
#[path = "kernel_test.rs"]
mod tests;
