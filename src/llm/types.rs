//! LLM types — wire-neutral request/response shapes and errors.
//!
//! The kernel only talks to one provider (`generateContent`), but the
//! operations in `kernel` build requests from these types so they can be
//! exercised against a mock [`GenerativeModel`].

use serde::{Deserialize, Serialize};

use crate::reliability::{Classify, ErrorClass, classify};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The required API key environment variable is not set.
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    /// The HTTP request to the provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// An image operation was called without usable base64 data.
    #[error("empty buffer")]
    EmptyBuffer,

    /// The model answered an image request without inline image data.
    #[error("no image output generated")]
    NoImageOutput,
}

impl Classify for LlmError {
    fn error_class(&self) -> ErrorClass {
        match self {
            Self::ApiResponse { status, body } => classify(&format!("{self} {status} {body}")),
            other => classify(&other.to_string()),
        }
    }
}

// =============================================================================
// CONTENT
// =============================================================================

/// Base64 payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One part of a content turn. Unknown part shapes deserialize as
/// [`Part::Other`] and are ignored downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

impl Part {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn jpeg(data: impl Into<String>) -> Self {
        Self::InlineData { inline_data: InlineData { mime_type: "image/jpeg".into(), data: data.into() } }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    #[must_use]
    pub fn user(parts: Vec<Part>) -> Self {
        Self { role: Some("user".into()), parts }
    }
}

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
    pub image_size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

/// Body of a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<serde_json::Value>,
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    #[must_use]
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents, system_instruction: None, tools: Vec::new(), generation_config: GenerationConfig::default() }
    }

    #[must_use]
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content { role: None, parts: vec![Part::text(instruction)] });
        self
    }
}

// =============================================================================
// RESPONSE
// =============================================================================

/// A web source the model grounded its answer on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Parsed `generateContent` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateResponse {
    pub candidates: Vec<Content>,
    pub sources: Vec<GroundingSource>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, `None` when it has none.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let first = self.candidates.first()?;
        let text: String = first
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// First inline payload across all candidates.
    #[must_use]
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .iter()
            .flat_map(|c| c.parts.iter())
            .find_map(|part| match part {
                Part::InlineData { inline_data } => Some(inline_data),
                _ => None,
            })
    }
}

// =============================================================================
// GENERATIVE MODEL TRAIT
// =============================================================================

/// Provider-neutral async trait for content generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send one `generateContent` request for `model`.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails or the response is malformed.
    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
