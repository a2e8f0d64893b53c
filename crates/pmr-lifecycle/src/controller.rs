//! The lifecycle controller itself: owns a [`Session`] and enforces that it
//! only ever advances one phase at a time, via `complete_phase` as the sole
//! mutation (spec.md §4.1).

use crate::error::LifecycleError;
use crate::gates::validate_phase_evidence;
use chrono::{DateTime, Utc};
use pmr_types::{Phase, Session, SessionStatus};
use serde_json::Value;

/// One phase's recorded evidence, kept even when that phase's gate
/// rejected it — evidence persists even on abort (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct PhaseEvidenceRecord {
    pub phase: Phase,
    pub evidence: Value,
    pub status: SessionStatus,
    pub recorded_at: DateTime<Utc>,
    pub gate_passed: bool,
}

pub struct LifecycleController {
    session: Session,
    history: Vec<PhaseEvidenceRecord>,
}

impl LifecycleController {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn history(&self) -> &[PhaseEvidenceRecord] {
        &self.history
    }

    /// Completes `phase` with `evidence` and a phase-level `status`
    /// contribution. Fails with `PhaseTransitionInvalid` if `phase` is not
    /// the session's current phase (catches both skip-ahead and re-entry
    /// after the fact). Evidence is recorded regardless of whether the
    /// gate accepts it; a malformed packet is fatal for the phase and sets
    /// the session status to `INVALID`, but the record is not discarded.
    pub fn complete_phase(
        &mut self,
        phase: Phase,
        evidence: Value,
        status: SessionStatus,
    ) -> Result<(), LifecycleError> {
        if self.session.completed_phases.contains(&Phase::Report) {
            return Err(LifecycleError::SessionAlreadyComplete);
        }
        if phase != self.session.current_phase {
            return Err(LifecycleError::PhaseTransitionInvalid {
                current: self.session.current_phase,
                attempted: phase,
            });
        }

        let gate_result = validate_phase_evidence(phase, &evidence);
        let gate_passed = gate_result.is_ok();

        self.history.push(PhaseEvidenceRecord {
            phase,
            evidence,
            status,
            recorded_at: Utc::now(),
            gate_passed,
        });

        if let Err(err) = gate_result {
            self.session.status = SessionStatus::Invalid;
            tracing::error!(phase = %phase, "phase evidence rejected by gate; session marked INVALID");
            return Err(err);
        }

        self.session.completed_phases.push(phase);
        self.session.status = SessionStatus::aggregate(
            self.history
                .iter()
                .filter(|r| r.gate_passed)
                .map(|r| r.status),
        );

        if let Some(next) = phase.next() {
            self.session.current_phase = next;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fresh_controller() -> LifecycleController {
        LifecycleController::new(Session::new(std::path::PathBuf::from("/tmp/project")))
    }

    #[test]
    fn advances_one_phase_at_a_time() {
        let mut controller = fresh_controller();
        controller
            .complete_phase(
                Phase::RequirementAnalysis,
                json!({"requirements": ["r1"]}),
                SessionStatus::Incomplete,
            )
            .unwrap();
        assert_eq!(controller.session().current_phase, Phase::TaskDecomposition);
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut controller = fresh_controller();
        let err = controller
            .complete_phase(Phase::Planning, json!({"plan_items": ["p1"]}), SessionStatus::Incomplete)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::PhaseTransitionInvalid { .. }));
        assert_eq!(controller.session().current_phase, Phase::RequirementAnalysis);
    }

    #[test]
    fn malformed_evidence_marks_session_invalid_but_keeps_the_record() {
        let mut controller = fresh_controller();
        let err = controller
            .complete_phase(Phase::RequirementAnalysis, json!({"requirements": []}), SessionStatus::Incomplete)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::MalformedEvidence { .. }));
        assert_eq!(controller.session().status, SessionStatus::Invalid);
        assert_eq!(controller.history().len(), 1);
        assert_eq!(controller.session().current_phase, Phase::RequirementAnalysis);
    }

    #[test]
    fn completing_report_leaves_session_at_report_and_blocks_further_completion() {
        let mut controller = fresh_controller();
        controller
            .complete_phase(Phase::RequirementAnalysis, json!({"requirements": ["r1"]}), SessionStatus::Complete)
            .unwrap();
        controller
            .complete_phase(Phase::TaskDecomposition, json!({"tasks": ["t1"]}), SessionStatus::Complete)
            .unwrap();
        controller
            .complete_phase(Phase::Planning, json!({"plan_items": ["p1"]}), SessionStatus::Complete)
            .unwrap();
        controller
            .complete_phase(
                Phase::Execution,
                json!({"task_results": [{"task_id": "t1", "status": "COMPLETE"}]}),
                SessionStatus::Complete,
            )
            .unwrap();
        controller
            .complete_phase(Phase::Qa, json!({"gate_results": []}), SessionStatus::Complete)
            .unwrap();
        controller
            .complete_phase(
                Phase::CompletionValidation,
                json!({"verdict": {"final_status": "COMPLETE"}}),
                SessionStatus::Complete,
            )
            .unwrap();
        controller
            .complete_phase(Phase::Report, json!({"summary": "done"}), SessionStatus::Complete)
            .unwrap();

        assert_eq!(controller.session().current_phase, Phase::Report);
        assert_eq!(controller.session().status, SessionStatus::Complete);

        let err = controller
            .complete_phase(Phase::Report, json!({"summary": "again"}), SessionStatus::Complete)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::SessionAlreadyComplete));
    }
}
