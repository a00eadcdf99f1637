//! Style profile ("DNA") extracted from a reference image.
//!
//! The model is asked for a strict JSON object, but fields still come back
//! missing or mistyped. [`ExtractionResult::from_model_json`] fills every gap
//! with a fixed default so panels never have to handle a partial profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::prompt::stylistic_name;

pub const DEFAULT_CATEGORY: &str = "Extracted Urban";
pub const DEFAULT_DESCRIPTION: &str = "Geometric lattice fragment";
pub const DEFAULT_PARAMETER: f64 = 50.0;

/// Authenticity at or above this marks a profile as harvestable.
pub const AUTHENTICITY_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StyleDomain {
    Vector,
    #[default]
    Typography,
    Monogram,
}

impl StyleDomain {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "vector" => Some(Self::Vector),
            "typography" => Some(Self::Typography),
            "monogram" => Some(Self::Monogram),
            _ => None,
        }
    }
}

/// Numeric style knobs, each on a 0–100 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleParameters {
    pub threshold: f64,
    pub smoothing: f64,
    pub detail: f64,
    pub edge: f64,
    /// Any extra numeric parameters the model chose to report.
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PARAMETER,
            smoothing: DEFAULT_PARAMETER,
            detail: DEFAULT_PARAMETER,
            edge: DEFAULT_PARAMETER,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub domain: StyleDomain,
    pub category: String,
    pub name: String,
    pub description: String,
    /// 0–1 certainty of the domain call.
    pub confidence: f64,
    /// 0–100 adherence to the detected style.
    pub style_authenticity_score: f64,
    pub palette: Vec<String>,
    pub parameters: StyleParameters,
}

impl ExtractionResult {
    /// Build a profile from the model's JSON, defaulting every missing or
    /// malformed field.
    #[must_use]
    pub fn from_model_json(raw: &Value) -> Self {
        let text = |key: &str| {
            raw.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let number = |key: &str| raw.get(key).and_then(Value::as_f64).unwrap_or(0.0);

        Self {
            domain: raw
                .get("domain")
                .and_then(Value::as_str)
                .and_then(StyleDomain::parse)
                .unwrap_or_default(),
            category: text("category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            name: text("name").unwrap_or_else(stylistic_name),
            description: text("description").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            confidence: number("confidence"),
            style_authenticity_score: number("styleAuthenticityScore"),
            palette: raw
                .get("palette")
                .and_then(Value::as_array)
                .map(|colors| colors.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            parameters: raw
                .get("parameters")
                .map(parse_parameters)
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_authentic(&self) -> bool {
        self.style_authenticity_score >= AUTHENTICITY_THRESHOLD
    }
}

fn parse_parameters(raw: &Value) -> StyleParameters {
    let Some(map) = raw.as_object() else {
        return StyleParameters::default();
    };
    let get = |key: &str| map.get(key).and_then(Value::as_f64).unwrap_or(DEFAULT_PARAMETER);
    let extra = map
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "threshold" | "smoothing" | "detail" | "edge"))
        .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n)))
        .collect();
    StyleParameters {
        threshold: get("threshold"),
        smoothing: get("smoothing"),
        detail: get("detail"),
        edge: get("edge"),
        extra,
    }
}

/// JSON schema sent with extraction requests.
#[must_use]
pub fn extraction_schema() -> Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "domain": { "type": "STRING", "description": "\"Vector\" | \"Typography\" | \"Monogram\"" },
            "category": { "type": "STRING", "description": "e.g. \"Urban Calligraphy\", \"Abstract Vector\", \"Heraldic Seal\"" },
            "name": { "type": "STRING", "description": "A high-concept name reflecting the style's essence" },
            "description": { "type": "STRING", "description": "Hyper-condensed summary of the validated attributes" },
            "confidence": { "type": "NUMBER", "description": "0-1, certainty of domain identification" },
            "styleAuthenticityScore": { "type": "NUMBER", "description": "0-100 adherence to the detected style" },
            "palette": { "type": "ARRAY", "items": { "type": "STRING" }, "description": "array of hex strings" },
            "parameters": {
                "type": "OBJECT",
                "properties": {
                    "threshold": { "type": "NUMBER", "description": "0-100" },
                    "smoothing": { "type": "NUMBER", "description": "0-100" },
                    "detail": { "type": "NUMBER", "description": "0-100" },
                    "edge": { "type": "NUMBER", "description": "0-100" }
                },
                "required": ["threshold", "smoothing", "detail", "edge"]
            }
        },
        "required": [
            "domain", "category", "name", "description",
            "confidence", "styleAuthenticityScore", "palette", "parameters"
        ]
    })
}

#[cfg(test)]
#[path = "style_test.rs"]
mod tests;
