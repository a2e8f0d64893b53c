//! Task: a unit of work dispatched to the executor.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ids::{EvidenceId, TaskId};

/// Closed tagged-variant for task categories. A single dispatch table is
/// indexed by this tag rather than using open inheritance (design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    ReadInfo,
    Report,
    LightEdit,
    Implementation,
    ReviewResponse,
    ConfigCiChange,
    /// The only task type permitted to terminate in `BLOCKED` status.
    DangerousOp,
}

/// Per-task resource granularity limits, derived from `pm-orchestrator.yaml`
/// `limits.*` (clamped to the bounds in that config).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GranularityLimits {
    pub max_files: u32,
    pub max_tests: u32,
    pub max_seconds: u64,
}

impl Default for GranularityLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_tests: 10,
            max_seconds: 300,
        }
    }
}

/// Status of a task. Mirrors `ExecutorStatus` plus the pre-execution states
/// a task passes through before it is ever handed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Complete,
    Incomplete,
    Error,
    NoEvidence,
    Blocked,
}

/// A unit of work with a natural-language prompt, forming a shallow tree
/// with its parent/subtasks (depth rarely exceeds 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub prompt: String,
    pub task_type: TaskType,
    pub limits: GranularityLimits,
    pub status: TaskStatus,
    pub evidence_refs: Vec<EvidenceId>,
    pub files_modified: Vec<String>,
    pub tests_required_before_implementation: bool,
    pub parent: Option<TaskId>,
    pub subtasks: Vec<TaskId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Free-form tags carried into structured log spans; not part of any
    /// spec invariant, just tracing context.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Forwarded verbatim as `--model <value>` when set; omitted entirely
    /// otherwise, letting the executor CLI fall back to its own default.
    /// The runner never validates this against a model registry — that is
    /// a REPL-layer concern (spec.md §4.2 "Model selection").
    #[serde(default)]
    pub selected_model: Option<String>,
}

impl Task {
    #[must_use]
    pub fn new(prompt: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            id: TaskId::new(),
            prompt: prompt.into(),
            task_type,
            limits: GranularityLimits::default(),
            status: TaskStatus::Pending,
            evidence_refs: Vec::new(),
            files_modified: Vec::new(),
            tests_required_before_implementation: false,
            parent: None,
            subtasks: Vec::new(),
            created_at: chrono::Utc::now(),
            labels: HashMap::new(),
            selected_model: None,
        }
    }
}
