//! LLM — Gemini adapter for the creative kernel.
//!
//! DESIGN
//! ======
//! One provider, one endpoint. The API key lives in a shared [`Credentials`]
//! slot that [`gemini::GeminiClient`] reads on every request, so a credential
//! recovery can swap the key between attempts of a retried call.

pub mod gemini;
pub mod types;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::read_api_key;
use crate::reliability::CredentialRecovery;
pub use gemini::GeminiClient;
pub use types::{GenerativeModel, LlmError};

// =============================================================================
// CREDENTIALS
// =============================================================================

/// Swappable API key shared between the client and its recovery hook.
#[derive(Clone)]
pub struct Credentials {
    key: Arc<RwLock<String>>,
}

impl Credentials {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: Arc::new(RwLock::new(key.into())) }
    }

    #[must_use]
    pub fn current(&self) -> String {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, key: impl Into<String>) {
        *self
            .key
            .write()
            .unwrap_or_else(PoisonError::into_inner) = key.into();
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("key", &"<redacted>").finish()
    }
}

// =============================================================================
// ENV RECOVERY
// =============================================================================

/// Re-reads the key variable into [`Credentials`]. Lets an operator rotate
/// the key in the process environment while calls are failing.
pub struct EnvCredentialRecovery {
    var: String,
    credentials: Credentials,
}

impl EnvCredentialRecovery {
    #[must_use]
    pub fn new(var: impl Into<String>, credentials: Credentials) -> Self {
        Self { var: var.into(), credentials }
    }
}

#[async_trait::async_trait]
impl CredentialRecovery for EnvCredentialRecovery {
    async fn reauthenticate(&self) {
        match read_api_key(&self.var) {
            Ok(key) => {
                self.credentials.replace(key);
                info!(var = %self.var, "API key reloaded");
            }
            Err(e) => warn!(error = %e, "API key reload failed; retrying with current key"),
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
