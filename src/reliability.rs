//! Request reliability — quota backoff and credential recovery around one call.
//!
//! DESIGN
//! ======
//! Every remote call the kernel makes goes through [`ReliableRequest::run`].
//! Failures are sorted into three classes by [`classify`], a pure function
//! over the error text, so the matching rules can change without touching
//! the retry loop:
//!
//! - Quota: sleep `step * n` for the n-th retry, up to `max_retries`. Once the
//!   budget is spent, ask the host to re-authenticate (a different key may
//!   carry separate quota) and try exactly once more.
//! - Auth: re-authenticate and try exactly once more, whatever the budget.
//! - Other: returned to the caller untouched.
//!
//! TRADE-OFFS
//! ==========
//! Matching on message text couples us to the provider's error wording. New
//! upstream formats fall through to `Other` and surface immediately.
//!
//! Re-authentication is an injected [`CredentialRecovery`] rather than a
//! process global. Concurrent calls that all fail auth each trigger their
//! own recovery.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_STEP_MS: u64 = 1500;

const QUOTA_MARKERS: &[&str] = &["429", "quota", "resource_exhausted"];
const AUTH_MARKERS: &[&str] = &["requested entity was not found", "api_key_invalid"];

// =============================================================================
// CLASSIFICATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Rate limited; recoverable with backoff.
    Quota,
    /// Missing or invalid credential; recoverable with re-authentication.
    Auth,
    /// Everything else. Fatal to the call.
    Other,
}

/// Map raw error text to an [`ErrorClass`]. Case-insensitive; credential
/// markers win over quota markers.
#[must_use]
pub fn classify(text: &str) -> ErrorClass {
    let text = text.to_lowercase();
    if AUTH_MARKERS.iter().any(|m| text.contains(m)) {
        ErrorClass::Auth
    } else if QUOTA_MARKERS.iter().any(|m| text.contains(m)) {
        ErrorClass::Quota
    } else {
        ErrorClass::Other
    }
}

/// Errors that can report which recovery class they fall into.
pub trait Classify {
    fn error_class(&self) -> ErrorClass;
}

// =============================================================================
// CREDENTIAL RECOVERY
// =============================================================================

/// Host hook that lets the user re-select or re-enter the API key.
#[async_trait::async_trait]
pub trait CredentialRecovery: Send + Sync {
    async fn reauthenticate(&self);
}

/// Recovery hook for hosts that cannot re-prompt. The follow-up attempt
/// still happens.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecovery;

#[async_trait::async_trait]
impl CredentialRecovery for NoRecovery {
    async fn reauthenticate(&self) {}
}

// =============================================================================
// RETRY POLICY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl RetryPolicy {
    /// Delay before the retry made while `remaining` retries are left.
    #[must_use]
    pub fn delay_for(&self, remaining: u32) -> Duration {
        let nth = (u64::from(self.max_retries) + 1).saturating_sub(u64::from(remaining));
        self.backoff_step
            .saturating_mul(u32::try_from(nth).unwrap_or(u32::MAX))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, backoff_step: Duration::from_millis(DEFAULT_BACKOFF_STEP_MS) }
    }
}

// =============================================================================
// RELIABLE REQUEST
// =============================================================================

#[derive(Clone)]
pub struct ReliableRequest {
    policy: RetryPolicy,
    recovery: Arc<dyn CredentialRecovery>,
}

impl ReliableRequest {
    #[must_use]
    pub fn new(policy: RetryPolicy, recovery: Arc<dyn CredentialRecovery>) -> Self {
        Self { policy, recovery }
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op`, recovering from quota and credential failures.
    ///
    /// # Errors
    ///
    /// Returns the original error for unclassified failures, and the error of
    /// the final attempt after re-authentication.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::fmt::Display,
    {
        let mut remaining = self.policy.max_retries;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match err.error_class() {
                ErrorClass::Auth => {
                    error!(error = %err, "API key invalid or not found; prompting re-selection");
                    self.recovery.reauthenticate().await;
                    return op().await;
                }
                ErrorClass::Quota if remaining > 0 => {
                    let delay = self.policy.delay_for(remaining);
                    warn!(?delay, retries_left = remaining, "quota reached; cooling down");
                    tokio::time::sleep(delay).await;
                    remaining -= 1;
                }
                ErrorClass::Quota => {
                    error!(error = %err, "quota exceeded with retries exhausted; forcing key audit");
                    self.recovery.reauthenticate().await;
                    return op().await;
                }
                ErrorClass::Other => return Err(err),
            }
        }
    }
}

impl Default for ReliableRequest {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Arc::new(NoRecovery))
    }
}

#[cfg(test)]
#[path = "reliability_test.rs"]
mod tests;
