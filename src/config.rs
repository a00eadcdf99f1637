//! Kernel configuration parsed from environment variables.

use std::time::Duration;

use crate::llm::types::LlmError;
use crate::reliability::{DEFAULT_BACKOFF_STEP_MS, DEFAULT_MAX_RETRIES, RetryPolicy};

pub const DEFAULT_API_KEY_VAR: &str = "API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_THINKING_BUDGET: u32 = 0;
pub const DEFAULT_DEVICE_CONTEXT: &str = "MAXIMUM_ARCHITECTURE_OMEGA_V5";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Upper bounds for the retry budget read from the environment.
pub const MAX_RETRIES_LIMIT: u32 = 10;
pub const MAX_BACKOFF_STEP_MS: u64 = 60_000;

/// Per-call knobs panels pass down to the kernel operations.
#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    pub model: String,
    pub temperature: f32,
    pub thinking_budget: u32,
    pub device_context: String,
    /// Route image synthesis to the pro image model.
    pub use_pro_model: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            device_context: DEFAULT_DEVICE_CONTEXT.to_string(),
            use_pro_model: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for LlmTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Name of the env var holding the key. Re-read on re-authentication.
    pub api_key_var: String,
    pub api_key: String,
    pub base_url: String,
    pub timeouts: LlmTimeouts,
    pub kernel: KernelConfig,
    pub retry: RetryPolicy,
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// - `KERNEL_API_KEY_ENV`: names the env var containing the key (default `API_KEY`)
    /// - `KERNEL_BASE_URL`: Gemini API base URL
    /// - `KERNEL_MODEL`, `KERNEL_TEMPERATURE`, `KERNEL_THINKING_BUDGET`,
    ///   `KERNEL_DEVICE_CONTEXT`, `KERNEL_USE_PRO_MODEL`: default [`KernelConfig`]
    /// - `KERNEL_MAX_RETRIES`: default 3, at most 10
    /// - `KERNEL_BACKOFF_STEP_MS`: default 1500, at most 60000
    /// - `KERNEL_REQUEST_TIMEOUT_SECS`: default 120
    /// - `KERNEL_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing or a typed value fails to parse.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key_var = std::env::var("KERNEL_API_KEY_ENV").unwrap_or_else(|_| DEFAULT_API_KEY_VAR.to_string());
        let api_key = read_api_key(&api_key_var)?;

        let base_url = std::env::var("KERNEL_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let kernel = KernelConfig {
            model: std::env::var("KERNEL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            temperature: parse_temperature(std::env::var("KERNEL_TEMPERATURE").ok().as_deref())?,
            thinking_budget: env_parse("KERNEL_THINKING_BUDGET", DEFAULT_THINKING_BUDGET),
            device_context: std::env::var("KERNEL_DEVICE_CONTEXT")
                .unwrap_or_else(|_| DEFAULT_DEVICE_CONTEXT.to_string()),
            use_pro_model: parse_bool("KERNEL_USE_PRO_MODEL", std::env::var("KERNEL_USE_PRO_MODEL").ok().as_deref())?,
        };

        let retry = RetryPolicy {
            max_retries: env_parse_bounded("KERNEL_MAX_RETRIES", DEFAULT_MAX_RETRIES, MAX_RETRIES_LIMIT)?,
            backoff_step: Duration::from_millis(env_parse_bounded(
                "KERNEL_BACKOFF_STEP_MS",
                DEFAULT_BACKOFF_STEP_MS,
                MAX_BACKOFF_STEP_MS,
            )?),
        };

        let timeouts = LlmTimeouts {
            request_secs: env_parse("KERNEL_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("KERNEL_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key_var, api_key, base_url, timeouts, kernel, retry })
    }
}

/// Read a non-empty API key from `var`.
///
/// # Errors
///
/// Returns [`LlmError::MissingApiKey`] when the variable is unset or blank.
pub fn read_api_key(var: &str) -> Result<String, LlmError> {
    std::env::var(var)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey { var: var.to_string() })
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Like [`env_parse`], but a parsed value above `max` is an error.
fn env_parse_bounded<T>(key: &str, default: T, max: T) -> Result<T, LlmError>
where
    T: std::str::FromStr + Copy + PartialOrd + std::fmt::Display,
{
    let value = env_parse(key, default);
    if value > max {
        return Err(LlmError::ConfigParse(format!("invalid {key} '{value}' (expected at most {max})")));
    }
    Ok(value)
}

fn parse_temperature(raw: Option<&str>) -> Result<f32, LlmError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TEMPERATURE);
    };
    match raw.parse::<f32>() {
        Ok(t) if (0.0..=2.0).contains(&t) => Ok(t),
        _ => Err(LlmError::ConfigParse(format!("invalid KERNEL_TEMPERATURE '{raw}' (expected 0.0..=2.0)"))),
    }
}

fn parse_bool(key: &str, raw: Option<&str>) -> Result<bool, LlmError> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None | Some("" | "0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(LlmError::ConfigParse(format!("invalid {key} '{other}' (expected true or false)"))),
    }
}

/// Env-mutating tests hold this so they stay serial under the threaded runner.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
