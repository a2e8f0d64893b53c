//! Thread / Run / TaskLog: the logging entity hierarchy.
//!
//! A Session owns one or more Threads; each Thread owns one or more Runs;
//! each Run owns TaskLogs. Session exclusively owns its Tasks, Runs, and
//! TaskLogs (see the data model's ownership rules).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{RunId, SessionId, TaskId, TaskLogId, ThreadId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
    Main,
    Background,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub session_id: SessionId,
    pub kind: ThreadKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub thread_id: ThreadId,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Fixed vocabulary of TaskLog event types. Closed on purpose: consumers
/// (the REPL/UI layer) switch over this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskLogEventType {
    UserInput,
    TaskStarted,
    TaskCompleted,
    TaskError,
    LlmMediationRequest,
    LlmMediationResponse,
    ExecutorDispatch,
    ExecutorOutput,
    FileOperation,
    TestExecution,
    ReviewLoopIteration,
    ReviewLoopJudgment,
    ReviewLoopMaxIterations,
    ChunkReceived,
    ChunkDropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Summary,
    Full,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLog {
    pub id: TaskLogId,
    pub run_id: RunId,
    pub task_id: Option<TaskId>,
    pub event_type: TaskLogEventType,
    pub visibility: Visibility,
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}
