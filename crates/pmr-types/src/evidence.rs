//! Evidence: an immutable record of one atomic operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EvidenceId, ExecutorId, TaskId};

/// The kind of atomic operation an evidence record corroborates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    FileWrite,
    FileVerification,
    TestExecution,
    PhaseTransition,
    ReviewIteration,
    CompletionVerdict,
}

/// One artifact referenced by an evidence record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub path: String,
    pub content: Option<String>,
    pub size: Option<u64>,
}

/// An immutable record that corroborates a claimed operation. Append-only:
/// modification requires a new record, never mutation of an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub task_id: TaskId,
    pub timestamp: DateTime<Utc>,
    pub operation: OperationType,
    pub executor_id: ExecutorId,
    pub artifacts: Vec<Artifact>,
    /// `sha256:<hex>`, computed over artifact paths + content.
    pub content_hash: String,
    pub raw_log_ref: Option<String>,
    pub integrity_validated: bool,
}
