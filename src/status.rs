//! Generation status — phase label plus busy flag for one panel.
//!
//! DESIGN
//! ======
//! A panel owns one [`StatusTracker`] and moves it through phases as its
//! remote call progresses. The tracker keeps exactly two labels, `current`
//! and `previous`, so a failed or abandoned phase can be rolled back one
//! step. There is no deeper undo.
//!
//! [`StatusTracker::transition`] accepts any label after any other. Labels
//! drive UI text only; the panel decides which phase comes next.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// STATUS LABELS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationStatus {
    #[default]
    Idle,
    /// Waiting for the user to supply an input buffer.
    Starving,
    BufferLoaded,
    DevouringBuffer,
    /// A style profile is attached to the panel.
    DnaLinked,
    DnaStylizeActive,
    /// A generated result is ready.
    LatticeActive,
    LatticeFail,
    DnaHarvested,
    AuditingBuffer,
    DetectingSilhouette,
    DnaRestored,
    CriticalDrift,
}

impl GenerationStatus {
    pub const ALL: [Self; 13] = [
        Self::Idle,
        Self::Starving,
        Self::BufferLoaded,
        Self::DevouringBuffer,
        Self::DnaLinked,
        Self::DnaStylizeActive,
        Self::LatticeActive,
        Self::LatticeFail,
        Self::DnaHarvested,
        Self::AuditingBuffer,
        Self::DetectingSilhouette,
        Self::DnaRestored,
        Self::CriticalDrift,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Starving => "STARVING",
            Self::BufferLoaded => "BUFFER_LOADED",
            Self::DevouringBuffer => "DEVOURING_BUFFER",
            Self::DnaLinked => "DNA_LINKED",
            Self::DnaStylizeActive => "DNA_STYLIZE_ACTIVE",
            Self::LatticeActive => "LATTICE_ACTIVE",
            Self::LatticeFail => "LATTICE_FAIL",
            Self::DnaHarvested => "DNA_HARVESTED",
            Self::AuditingBuffer => "AUDITING_BUFFER",
            Self::DetectingSilhouette => "DETECTING_SILHOUETTE",
            Self::DnaRestored => "DNA_RESTORED",
            Self::CriticalDrift => "CRITICAL_DRIFT",
        }
    }

    /// Labels that stand for an in-flight remote call.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::DevouringBuffer | Self::DnaStylizeActive | Self::AuditingBuffer | Self::DetectingSilhouette
        )
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown generation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for GenerationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// TRACKER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTracker {
    current: GenerationStatus,
    previous: GenerationStatus,
    busy: bool,
}

impl StatusTracker {
    #[must_use]
    pub fn new(initial: GenerationStatus) -> Self {
        Self { current: initial, previous: initial, busy: false }
    }

    #[must_use]
    pub fn status(&self) -> GenerationStatus {
        self.current
    }

    #[must_use]
    pub fn previous(&self) -> GenerationStatus {
        self.previous
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Move to `next`, remembering the current label for [`Self::revert`].
    pub fn transition(&mut self, next: GenerationStatus, busy: bool) {
        tracing::debug!(from = %self.current, to = %next, busy, "status transition");
        self.previous = self.current;
        self.current = next;
        self.busy = busy;
    }

    /// Restore the label held before the last transition and clear busy.
    pub fn revert(&mut self) {
        self.current = self.previous;
        self.busy = false;
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new(GenerationStatus::Idle)
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
