//! Session: one orchestration run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SessionId;
use crate::phase::Phase;

/// Aggregate status of a session. Derived from task/evidence state, never
/// set ad-hoc. Ordered worst-to-best for aggregation: `INVALID > ERROR >
/// NO_EVIDENCE > INCOMPLETE > COMPLETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Best outcome sorts last so `max()` over a set of statuses yields the
    /// worst one, matching the aggregation priority in the data model.
    Complete,
    Incomplete,
    NoEvidence,
    Error,
    Invalid,
}

impl SessionStatus {
    /// Aggregate a set of per-task/per-phase statuses into one session
    /// status: the worst status present wins.
    #[must_use]
    pub fn aggregate<I: IntoIterator<Item = Self>>(statuses: I) -> Self {
        statuses.into_iter().max().unwrap_or(Self::NoEvidence)
    }
}

/// One orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub target_project: std::path::PathBuf,
    pub started_at: DateTime<Utc>,
    pub current_phase: Phase,
    pub status: SessionStatus,
    /// Set by the caller to let the lifecycle controller proceed past a
    /// phase boundary that requires explicit sign-off.
    pub continuation_approved: bool,
    pub completed_phases: Vec<Phase>,
    /// Stamped at creation; lets a resumed session detect a runner version
    /// skew against whatever wrote `session.json`.
    pub created_by_version: String,
}

impl Session {
    #[must_use]
    pub fn new(target_project: std::path::PathBuf) -> Self {
        Self {
            id: SessionId::new(),
            target_project,
            started_at: Utc::now(),
            current_phase: Phase::first(),
            status: SessionStatus::Incomplete,
            continuation_approved: false,
            completed_phases: Vec::new(),
            created_by_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_picks_worst_status() {
        let statuses = [
            SessionStatus::Complete,
            SessionStatus::Incomplete,
            SessionStatus::Error,
        ];
        assert_eq!(SessionStatus::aggregate(statuses), SessionStatus::Error);
    }

    #[test]
    fn aggregate_all_complete_is_complete() {
        let statuses = [SessionStatus::Complete, SessionStatus::Complete];
        assert_eq!(SessionStatus::aggregate(statuses), SessionStatus::Complete);
    }

    #[test]
    fn aggregate_invalid_dominates_everything() {
        let statuses = [
            SessionStatus::Complete,
            SessionStatus::Invalid,
            SessionStatus::Error,
        ];
        assert_eq!(SessionStatus::aggregate(statuses), SessionStatus::Invalid);
    }

    #[test]
    fn aggregate_empty_is_no_evidence() {
        assert_eq!(SessionStatus::aggregate(std::iter::empty()), SessionStatus::NoEvidence);
    }
}
