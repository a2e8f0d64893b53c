//! ExecutorOutputChunk: one unit of the live-streamed executor output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{SessionId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStream {
    Stdout,
    Stderr,
    System,
    Spawn,
    Preflight,
    Guard,
    State,
    Error,
}

/// A chunk carries task + session identity so subscribers can reject stale
/// output (see `pmr-stream`'s fail-closed filter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorOutputChunk {
    pub timestamp: DateTime<Utc>,
    pub task_id: TaskId,
    pub session_id: SessionId,
    pub stream: ChunkStream,
    pub text: String,
    /// Monotonically increasing within one executor invocation.
    pub sequence: u64,
    pub project_id: Option<String>,
}
