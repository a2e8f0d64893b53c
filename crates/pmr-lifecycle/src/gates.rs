//! Per-phase minimum evidence schema (spec.md §4.1). One [`PhaseGate`] impl
//! per [`Phase`], the same "dispatch table indexed by tag" shape used for
//! task-type gating in `pmr-executor`, reused here for phases: each phase
//! owns its own validation of what a "complete" packet looks like, narrowed
//! to a minimal JSON-shape check since this crate has no LLM prompt of its
//! own to build.

use crate::error::LifecycleError;
use pmr_types::Phase;
use serde_json::Value;

pub trait PhaseGate {
    fn phase(&self) -> Phase;

    /// Validates that `evidence` satisfies this phase's minimum schema.
    /// Returns the specific reason on failure so callers can surface it.
    fn validate(&self, evidence: &Value) -> Result<(), String>;
}

fn non_empty_array(evidence: &Value, field: &str) -> Result<(), String> {
    match evidence.get(field) {
        Some(Value::Array(items)) if !items.is_empty() => Ok(()),
        Some(Value::Array(_)) => Err(format!("`{field}` is present but empty")),
        Some(_) => Err(format!("`{field}` is not an array")),
        None => Err(format!("missing required field `{field}`")),
    }
}

struct RequirementAnalysisGate;
impl PhaseGate for RequirementAnalysisGate {
    fn phase(&self) -> Phase {
        Phase::RequirementAnalysis
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        non_empty_array(evidence, "requirements")
    }
}

struct TaskDecompositionGate;
impl PhaseGate for TaskDecompositionGate {
    fn phase(&self) -> Phase {
        Phase::TaskDecomposition
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        non_empty_array(evidence, "tasks")
    }
}

struct PlanningGate;
impl PhaseGate for PlanningGate {
    fn phase(&self) -> Phase {
        Phase::Planning
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        non_empty_array(evidence, "plan_items")
    }
}

struct ExecutionGate;
impl PhaseGate for ExecutionGate {
    fn phase(&self) -> Phase {
        Phase::Execution
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        non_empty_array(evidence, "task_results")?;
        let results = evidence["task_results"].as_array().expect("checked above");
        for (index, result) in results.iter().enumerate() {
            if result.get("task_id").is_none() {
                return Err(format!("task_results[{index}] is missing `task_id`"));
            }
            if result.get("status").is_none() {
                return Err(format!("task_results[{index}] is missing `status`"));
            }
        }
        Ok(())
    }
}

struct QaGate;
impl PhaseGate for QaGate {
    fn phase(&self) -> Phase {
        Phase::Qa
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        match evidence.get("gate_results") {
            Some(Value::Array(_)) => Ok(()),
            Some(_) => Err("`gate_results` is not an array".to_string()),
            None => Err("missing required field `gate_results`".to_string()),
        }
    }
}

struct CompletionValidationGate;
impl PhaseGate for CompletionValidationGate {
    fn phase(&self) -> Phase {
        Phase::CompletionValidation
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        match evidence.get("verdict").and_then(|v| v.get("final_status")) {
            Some(Value::String(_)) => Ok(()),
            _ => Err("missing `verdict.final_status`".to_string()),
        }
    }
}

struct ReportGate;
impl PhaseGate for ReportGate {
    fn phase(&self) -> Phase {
        Phase::Report
    }
    fn validate(&self, evidence: &Value) -> Result<(), String> {
        match evidence.get("summary") {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(()),
            Some(Value::String(_)) => Err("`summary` is empty".to_string()),
            _ => Err("missing required field `summary`".to_string()),
        }
    }
}

#[must_use]
pub fn gate_for(phase: Phase) -> Box<dyn PhaseGate + Send + Sync> {
    match phase {
        Phase::RequirementAnalysis => Box::new(RequirementAnalysisGate),
        Phase::TaskDecomposition => Box::new(TaskDecompositionGate),
        Phase::Planning => Box::new(PlanningGate),
        Phase::Execution => Box::new(ExecutionGate),
        Phase::Qa => Box::new(QaGate),
        Phase::CompletionValidation => Box::new(CompletionValidationGate),
        Phase::Report => Box::new(ReportGate),
    }
}

/// Validates `evidence` against `phase`'s gate, translating the plain
/// string reason into a [`LifecycleError::MalformedEvidence`].
pub fn validate_phase_evidence(phase: Phase, evidence: &Value) -> Result<(), LifecycleError> {
    gate_for(phase)
        .validate(evidence)
        .map_err(|reason| LifecycleError::MalformedEvidence { phase, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requirement_analysis_needs_non_empty_requirements() {
        assert!(validate_phase_evidence(Phase::RequirementAnalysis, &json!({"requirements": []})).is_err());
        assert!(validate_phase_evidence(Phase::RequirementAnalysis, &json!({"requirements": ["r1"]})).is_ok());
    }

    #[test]
    fn execution_requires_task_id_and_status_per_entry() {
        let bad = json!({"task_results": [{"task_id": "t1"}]});
        assert!(validate_phase_evidence(Phase::Execution, &bad).is_err());

        let good = json!({"task_results": [{"task_id": "t1", "status": "COMPLETE"}]});
        assert!(validate_phase_evidence(Phase::Execution, &good).is_ok());
    }

    #[test]
    fn qa_allows_an_empty_gate_results_array() {
        assert!(validate_phase_evidence(Phase::Qa, &json!({"gate_results": []})).is_ok());
    }

    #[test]
    fn report_rejects_blank_summary() {
        assert!(validate_phase_evidence(Phase::Report, &json!({"summary": "   "})).is_err());
    }
}
