//! Gate result and verdict shapes (spec.md §4.4).

use serde::{Deserialize, Serialize};

/// One QA gate's raw result (lint, test, typecheck, build, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub gate_name: String,
    pub run_id: String,
    pub failing: u32,
    pub skipped: u32,
    #[serde(default)]
    pub raw_output: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalStatus {
    Complete,
    Failing,
    NoEvidence,
}

/// Per-gate rollup line in the verdict's `gate_summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSummary {
    pub gate_name: String,
    pub failing: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionVerdict {
    pub final_status: FinalStatus,
    /// True only when `final_status == Complete` — the ALL PASS condition.
    pub all_pass: bool,
    pub failing_total: u32,
    pub skipped_total: u32,
    pub failing_gates: Vec<String>,
    pub gate_summary: Vec<GateSummary>,
    pub run_id: Option<String>,
    pub judged_at: chrono::DateTime<chrono::Utc>,
    /// True when the caller's `current_run_id` context was stale relative
    /// to what was judged (kept only for informational replay; an actual
    /// mismatch raises `CompletionError::StaleRun` rather than setting
    /// this field — see `protocol::judge_completion`).
    pub stale_results: bool,
}
