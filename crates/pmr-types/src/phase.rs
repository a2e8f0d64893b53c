//! The seven ordered lifecycle phases.

use serde::{Deserialize, Serialize};

/// One phase of the session lifecycle. Ordered; advancement is to the
/// immediate next phase only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    RequirementAnalysis,
    TaskDecomposition,
    Planning,
    Execution,
    Qa,
    CompletionValidation,
    Report,
}

impl Phase {
    const ORDER: [Phase; 7] = [
        Phase::RequirementAnalysis,
        Phase::TaskDecomposition,
        Phase::Planning,
        Phase::Execution,
        Phase::Qa,
        Phase::CompletionValidation,
        Phase::Report,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequirementAnalysis => "REQUIREMENT_ANALYSIS",
            Self::TaskDecomposition => "TASK_DECOMPOSITION",
            Self::Planning => "PLANNING",
            Self::Execution => "EXECUTION",
            Self::Qa => "QA",
            Self::CompletionValidation => "COMPLETION_VALIDATION",
            Self::Report => "REPORT",
        }
    }

    /// The phase that must be completed before this one.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|p| p == self)?;
        idx.checked_sub(1).map(|i| Self::ORDER[i])
    }

    /// The only phase this phase is permitted to advance to. `None` once
    /// `Report` is complete: the session has no further phase.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        let idx = Self::ORDER.iter().position(|p| p == self)?;
        Self::ORDER.get(idx + 1).copied()
    }

    #[must_use]
    pub const fn first() -> Self {
        Self::RequirementAnalysis
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
