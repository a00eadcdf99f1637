//! Panel — per-panel workflow state driving the status tracker.
//!
//! A panel holds the uploaded buffer, linked DNA and last output, and moves
//! its [`StatusTracker`] through the generation lifecycle around each kernel
//! call. The busy flag doubles as the re-entrancy guard.

use tracing::{info, warn};

use crate::config::KernelConfig;
use crate::kernel::{Kernel, PanelMode};
use crate::llm::LlmError;
use crate::status::{GenerationStatus, StatusTracker};
use crate::style::ExtractionResult;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("panel is busy")]
    Busy,

    #[error("no buffer loaded")]
    NoBuffer,

    #[error("{} panel cannot synthesize", .0.as_str())]
    Unsupported(PanelMode),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone)]
pub struct Panel {
    mode: PanelMode,
    config: KernelConfig,
    tracker: StatusTracker,
    buffer: Option<String>,
    dna: Option<ExtractionResult>,
    output: Option<String>,
}

impl Panel {
    #[must_use]
    pub fn new(mode: PanelMode, config: KernelConfig) -> Self {
        Self {
            mode,
            config,
            tracker: StatusTracker::default(),
            buffer: None,
            dna: None,
            output: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    #[must_use]
    pub fn status(&self) -> GenerationStatus {
        self.tracker.status()
    }

    #[must_use]
    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.tracker.is_busy()
    }

    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        self.buffer.as_deref()
    }

    #[must_use]
    pub fn dna(&self) -> Option<&ExtractionResult> {
        self.dna.as_ref()
    }

    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn config_mut(&mut self) -> &mut KernelConfig {
        &mut self.config
    }

    /// Store an uploaded image data URL.
    pub fn load_buffer(&mut self, data_url: impl Into<String>) {
        self.buffer = Some(data_url.into());
        self.tracker.transition(GenerationStatus::BufferLoaded, false);
    }

    /// Bias later syntheses with `dna`.
    pub fn link_dna(&mut self, dna: ExtractionResult) {
        info!(panel = self.mode.as_str(), dna = %dna.name, "DNA linked");
        self.dna = Some(dna);
        self.tracker.transition(GenerationStatus::DnaLinked, false);
    }

    /// Drop buffer, DNA and output.
    pub fn clear(&mut self) {
        self.buffer = None;
        self.dna = None;
        self.output = None;
        self.tracker.transition(GenerationStatus::Starving, false);
    }

    /// Synthesize `prompt` with this panel's mode, seeded by the buffer and
    /// linked DNA when present.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Busy`] while another operation runs,
    /// [`PanelError::Unsupported`] on non-synthesis panels, and the kernel's
    /// error when synthesis fails.
    pub async fn generate(&mut self, kernel: &Kernel, prompt: &str) -> Result<&str, PanelError> {
        if self.is_busy() {
            return Err(PanelError::Busy);
        }
        let mode = self.mode.synthesis_mode().ok_or(PanelError::Unsupported(self.mode))?;

        let active = if self.dna.is_some() {
            GenerationStatus::DnaStylizeActive
        } else {
            GenerationStatus::DevouringBuffer
        };
        let call = InFlight::start(&mut self.tracker, active);

        let result = kernel
            .synthesize(mode, prompt, self.buffer.as_deref(), &self.config, self.dna.as_ref())
            .await;

        match result {
            Ok(url) => {
                call.settle(GenerationStatus::LatticeActive);
                Ok(self.output.insert(url).as_str())
            }
            Err(e) => {
                warn!(panel = self.mode.as_str(), error = %e, "synthesis failed");
                call.settle(GenerationStatus::LatticeFail);
                Err(e.into())
            }
        }
    }

    /// Extract DNA from the loaded buffer. Authentic profiles are linked to
    /// the panel; drifting ones are returned but left unlinked.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::NoBuffer`] when nothing is loaded, and the
    /// kernel's error when extraction fails.
    pub async fn extract(&mut self, kernel: &Kernel) -> Result<ExtractionResult, PanelError> {
        if self.is_busy() {
            return Err(PanelError::Busy);
        }
        let Some(buffer) = self.buffer.as_deref() else {
            self.tracker.transition(GenerationStatus::Starving, false);
            return Err(PanelError::NoBuffer);
        };

        let call = InFlight::start(&mut self.tracker, GenerationStatus::AuditingBuffer);
        match kernel.extract_style(buffer, &self.config).await {
            Ok(result) if result.is_authentic() => {
                self.dna = Some(result.clone());
                call.settle(GenerationStatus::DnaHarvested);
                Ok(result)
            }
            Ok(result) => {
                warn!(score = result.style_authenticity_score, "style authenticity below threshold");
                call.settle(GenerationStatus::CriticalDrift);
                Ok(result)
            }
            Err(e) => {
                warn!(panel = self.mode.as_str(), error = %e, "extraction failed");
                call.settle(GenerationStatus::LatticeFail);
                Err(e.into())
            }
        }
    }
}

// =============================================================================
// IN-FLIGHT GUARD
// =============================================================================

/// Holds the tracker busy for one remote call. Dropping it unsettled (the
/// caller abandoned the future) lands on `LATTICE_FAIL` with busy cleared.
struct InFlight<'a> {
    tracker: &'a mut StatusTracker,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(tracker: &'a mut StatusTracker, active: GenerationStatus) -> Self {
        tracker.transition(active, true);
        Self { tracker, settled: false }
    }

    fn settle(mut self, outcome: GenerationStatus) {
        self.tracker.transition(outcome, false);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(status = %self.tracker.status(), "call abandoned mid-flight");
            self.tracker.transition(GenerationStatus::LatticeFail, false);
        }
    }
}

#[cfg(test)]
#[path = "panel_test.rs"]
mod tests;
