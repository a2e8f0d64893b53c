//! Completion-verdict aggregation (spec.md §4.4, AC1-AC4).
//!
//! Folds a set of named conditions into a single pass/fail, with protocol
//! violations (here, run-id mismatches) raised as errors rather than folded
//! into the verdict itself: a policy violation is never downgraded to a
//! status value.

use crate::error::CompletionError;
use crate::run_id;
use crate::types::{CompletionVerdict, FinalStatus, GateResult, GateSummary};
use std::collections::HashSet;

/// AC1: COMPLETE only if failing == 0 across every gate.
/// AC2: every gate's run id must equal `current_run_id`, else `StaleRun`.
/// AC3: every gate must share the same run id, else `MixedRunIds`, checked
/// before the staleness comparison since it is the more fundamental
/// inconsistency.
/// AC4: no gates at all is `NO_EVIDENCE`, not `COMPLETE` — absence of
/// evidence is never treated as a pass.
pub fn judge_completion(
    current_run_id: &str,
    gates: &[GateResult],
) -> Result<CompletionVerdict, CompletionError> {
    if !run_id::is_well_formed(current_run_id) {
        return Err(CompletionError::InvalidRunIdFormat(current_run_id.to_string()));
    }

    if gates.is_empty() {
        return Ok(CompletionVerdict {
            final_status: FinalStatus::NoEvidence,
            all_pass: false,
            failing_total: 0,
            skipped_total: 0,
            failing_gates: Vec::new(),
            gate_summary: Vec::new(),
            run_id: None,
            judged_at: chrono::Utc::now(),
            stale_results: false,
        });
    }

    for gate in gates {
        if !run_id::is_well_formed(&gate.run_id) {
            return Err(CompletionError::InvalidRunIdFormat(gate.run_id.clone()));
        }
    }

    let distinct: HashSet<&str> = gates.iter().map(|g| g.run_id.as_str()).collect();
    if distinct.len() > 1 {
        return Err(CompletionError::MixedRunIds { count: distinct.len() });
    }

    if let Some(only) = distinct.iter().next() {
        if *only != current_run_id {
            let offending = gates.iter().find(|g| g.run_id != current_run_id).expect("mismatch exists");
            return Err(CompletionError::StaleRun {
                expected: current_run_id.to_string(),
                found: offending.run_id.clone(),
                gate_name: offending.gate_name.clone(),
            });
        }
    }

    let failing_total: u32 = gates.iter().map(|g| g.failing).sum();
    let skipped_total: u32 = gates.iter().map(|g| g.skipped).sum();
    let failing_gates: Vec<String> = gates
        .iter()
        .filter(|g| g.failing > 0)
        .map(|g| g.gate_name.clone())
        .collect();
    let gate_summary: Vec<GateSummary> = gates
        .iter()
        .map(|g| GateSummary {
            gate_name: g.gate_name.clone(),
            failing: g.failing,
            skipped: g.skipped,
        })
        .collect();

    let final_status = if failing_total == 0 {
        FinalStatus::Complete
    } else {
        FinalStatus::Failing
    };

    Ok(CompletionVerdict {
        all_pass: final_status == FinalStatus::Complete,
        final_status,
        failing_total,
        skipped_total,
        failing_gates,
        gate_summary,
        run_id: Some(current_run_id.to_string()),
        judged_at: chrono::Utc::now(),
        stale_results: false,
    })
}
