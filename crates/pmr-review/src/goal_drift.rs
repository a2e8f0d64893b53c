//! Goal-Drift Guard (GD1-GD5), active only when the orchestrator's
//! `activeTemplateId` is `"goal_drift_guard"` (spec.md §4.3, §9 design
//! notes). Each check compares the executor's claimed work against the
//! original task prompt rather than scoring the output in isolation, the
//! way [`crate::criteria`]'s Q1-Q6 do.
//!
//! Implemented as a static list of compiled regexes checked against the
//! output text, widened here to also consult the originating prompt rather
//! than scoring output in isolation.

use crate::criteria::{CriterionId, CriterionOutcome};
use crate::error::ReviewError;
use once_cell::sync::Lazy;
use pmr_types::ExecutorResult;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalDriftCheckId {
    Gd1ScopeExpansion,
    Gd2DeliverableSubstitution,
    Gd3SilentRequirementDrop,
    Gd4UnauthorizedDeletion,
    Gd5UnrequestedRefactor,
}

impl GoalDriftCheckId {
    /// Every GD check reports against the Q-criterion it overlaps with, so
    /// one rejection list can carry both kinds of failure uniformly.
    #[must_use]
    pub fn reports_as(self) -> CriterionId {
        match self {
            GoalDriftCheckId::Gd1ScopeExpansion => CriterionId::Q3NoOmissionMarkers,
            GoalDriftCheckId::Gd2DeliverableSubstitution => CriterionId::Q1FilesVerified,
            GoalDriftCheckId::Gd3SilentRequirementDrop => CriterionId::Q5EvidencePresent,
            GoalDriftCheckId::Gd4UnauthorizedDeletion => CriterionId::Q1FilesVerified,
            GoalDriftCheckId::Gd5UnrequestedRefactor => CriterionId::Q6NoEarlyTermination,
        }
    }

    fn name(self) -> &'static str {
        match self {
            GoalDriftCheckId::Gd1ScopeExpansion => "GD1_scope_expansion",
            GoalDriftCheckId::Gd2DeliverableSubstitution => "GD2_deliverable_substitution",
            GoalDriftCheckId::Gd3SilentRequirementDrop => "GD3_silent_requirement_drop",
            GoalDriftCheckId::Gd4UnauthorizedDeletion => "GD4_unauthorized_deletion",
            GoalDriftCheckId::Gd5UnrequestedRefactor => "GD5_unrequested_refactor",
        }
    }
}

pub trait GoalDriftCheck {
    fn id(&self) -> GoalDriftCheckId;
    fn evaluate(&self, original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError>;
}

fn ok(id: GoalDriftCheckId, passed: bool, detail: impl Into<String>) -> CriterionOutcome {
    CriterionOutcome {
        id: id.reports_as(),
        passed,
        detail: detail.into(),
    }
}

static SCOPE_EXPANSION_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "while i was at it",
        "also took the liberty",
        "additionally improved",
        "went ahead and also",
    ]
});

pub struct ScopeExpansionCheck;

impl GoalDriftCheck for ScopeExpansionCheck {
    fn id(&self) -> GoalDriftCheckId {
        GoalDriftCheckId::Gd1ScopeExpansion
    }

    fn evaluate(&self, _original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError> {
        let lower = result.output.to_lowercase();
        match SCOPE_EXPANSION_PHRASES.iter().find(|phrase| lower.contains(*phrase)) {
            Some(phrase) => Ok(ok(self.id(), false, format!("unrequested scope expansion: \"{phrase}\""))),
            None => Ok(ok(self.id(), true, "no scope expansion detected")),
        }
    }
}

static QUOTED_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[`\x27\x22]([\w./-]+\.\w+)[`\x27\x22]").expect("valid regex"));

pub struct DeliverableSubstitutionCheck;

impl GoalDriftCheck for DeliverableSubstitutionCheck {
    fn id(&self) -> GoalDriftCheckId {
        GoalDriftCheckId::Gd2DeliverableSubstitution
    }

    fn evaluate(&self, original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError> {
        let Some(requested) = QUOTED_FILENAME.captures(original_prompt).map(|c| c[1].to_string()) else {
            return Ok(ok(self.id(), true, "prompt named no specific deliverable"));
        };
        let delivered = result.files_modified.iter().any(|f| f.contains(&requested));
        if delivered {
            Ok(ok(self.id(), true, format!("delivered requested file {requested}")))
        } else {
            Ok(ok(
                self.id(),
                false,
                format!("prompt named {requested} but it was never touched"),
            ))
        }
    }
}

static SILENT_DROP_PHRASES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["decided not to", "skipped because", "opted out of", "chose to skip"]);

pub struct SilentRequirementDropCheck;

impl GoalDriftCheck for SilentRequirementDropCheck {
    fn id(&self) -> GoalDriftCheckId {
        GoalDriftCheckId::Gd3SilentRequirementDrop
    }

    fn evaluate(&self, _original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError> {
        let lower = result.output.to_lowercase();
        match SILENT_DROP_PHRASES.iter().find(|phrase| lower.contains(*phrase)) {
            Some(phrase) => Ok(ok(self.id(), false, format!("requirement silently dropped: \"{phrase}\""))),
            None => Ok(ok(self.id(), true, "no dropped requirement detected")),
        }
    }
}

static DELETION_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| vec!["deleted", "removed", "rm -rf"]);
static DELETION_AUTHORIZED_WORDS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["delete", "remove", "clean up"]);

pub struct UnauthorizedDeletionCheck;

impl GoalDriftCheck for UnauthorizedDeletionCheck {
    fn id(&self) -> GoalDriftCheckId {
        GoalDriftCheckId::Gd4UnauthorizedDeletion
    }

    fn evaluate(&self, original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError> {
        let output_lower = result.output.to_lowercase();
        let mentions_deletion = DELETION_PHRASES.iter().any(|phrase| output_lower.contains(phrase));
        if !mentions_deletion {
            return Ok(ok(self.id(), true, "no deletion mentioned"));
        }
        let prompt_lower = original_prompt.to_lowercase();
        let authorized = DELETION_AUTHORIZED_WORDS.iter().any(|word| prompt_lower.contains(word));
        if authorized {
            Ok(ok(self.id(), true, "deletion was requested"))
        } else {
            Ok(ok(self.id(), false, "output mentions deletion but prompt never requested it"))
        }
    }
}

static REFACTOR_PHRASES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["refactored", "reorganized", "restructured", "cleaned up the architecture"]);
static REFACTOR_AUTHORIZED_WORDS: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["refactor", "reorganize", "restructure", "clean up"]);

pub struct UnrequestedRefactorCheck;

impl GoalDriftCheck for UnrequestedRefactorCheck {
    fn id(&self) -> GoalDriftCheckId {
        GoalDriftCheckId::Gd5UnrequestedRefactor
    }

    fn evaluate(&self, original_prompt: &str, result: &ExecutorResult) -> Result<CriterionOutcome, ReviewError> {
        let output_lower = result.output.to_lowercase();
        let mentions_refactor = REFACTOR_PHRASES.iter().any(|phrase| output_lower.contains(phrase));
        if !mentions_refactor {
            return Ok(ok(self.id(), true, "no refactor mentioned"));
        }
        let prompt_lower = original_prompt.to_lowercase();
        let authorized = REFACTOR_AUTHORIZED_WORDS.iter().any(|word| prompt_lower.contains(word));
        if authorized {
            Ok(ok(self.id(), true, "refactor was requested"))
        } else {
            Ok(ok(self.id(), false, "output mentions refactoring but prompt never requested it"))
        }
    }
}

/// All five checks, in GD1-GD5 order.
#[must_use]
pub fn all_checks() -> Vec<Box<dyn GoalDriftCheck + Send + Sync>> {
    vec![
        Box::new(ScopeExpansionCheck),
        Box::new(DeliverableSubstitutionCheck),
        Box::new(SilentRequirementDropCheck),
        Box::new(UnauthorizedDeletionCheck),
        Box::new(UnrequestedRefactorCheck),
    ]
}

/// Runs every GD check. Fail-closed: an evaluator that errors is reported as
/// a failing outcome rather than silently skipped.
pub fn evaluate_all(original_prompt: &str, result: &ExecutorResult) -> Vec<CriterionOutcome> {
    all_checks()
        .iter()
        .map(|check| match check.evaluate(original_prompt, result) {
            Ok(outcome) => outcome,
            Err(err) => CriterionOutcome {
                id: check.id().reports_as(),
                passed: false,
                detail: format!("{} evaluator failed closed: {err}", check.id().name()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmr_types::{ExecutorStatus, VerifiedFile};

    fn base_result() -> ExecutorResult {
        ExecutorResult {
            executed: true,
            output: String::new(),
            files_modified: Vec::new(),
            verified_files: Vec::<VerifiedFile>::new(),
            unverified_files: Vec::new(),
            duration_ms: 0,
            status: ExecutorStatus::Complete,
            working_directory: std::path::PathBuf::from("."),
            blocked_reason: None,
            terminated_by: None,
            clarification: None,
        }
    }

    #[test]
    fn flags_unrequested_deletion() {
        let mut result = base_result();
        result.output = "I removed the old config module entirely.".into();
        let outcome = UnauthorizedDeletionCheck.evaluate("Add a health check endpoint", &result).unwrap();
        assert!(!outcome.passed);
    }

    #[test]
    fn allows_requested_deletion() {
        let mut result = base_result();
        result.output = "Removed the deprecated handler as requested.".into();
        let outcome = UnauthorizedDeletionCheck.evaluate("Please remove the deprecated handler", &result).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn flags_deliverable_substitution() {
        let mut result = base_result();
        result.files_modified.push("CHANGELOG.md".into());
        let outcome = DeliverableSubstitutionCheck
            .evaluate("Please create `README.md` with setup instructions", &result)
            .unwrap();
        assert!(!outcome.passed);
    }
}
