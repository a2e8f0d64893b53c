//! Structured outcome of one executor invocation.

use crate::clarification::ClarificationSignal;
use serde::{Deserialize, Serialize};

/// Status derivation is the *only* permitted mapping (see `pmr-executor`);
/// this enum exists here so every crate that consumes an `ExecutorResult`
/// shares the same vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorStatus {
    Complete,
    Incomplete,
    Error,
    NoEvidence,
    Blocked,
}

/// Why a terminator ended the child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockedReason {
    InteractivePrompt,
    Timeout,
    StdinRequired,
}

/// Identity of whatever ended the child process, recorded alongside
/// `blocked_reason` for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminator {
    /// The overall-timeout timer fired.
    OverallTimeout,
    /// Interactive-prompt detection terminated the child immediately,
    /// refusing to let it wait on stdin that will never be supplied.
    ReplFailClosed,
    /// An explicit caller-issued cancellation.
    Cancellation,
}

/// One file the runner checked on disk after the executor claimed to have
/// touched it (or that the before/after snapshot detected as modified).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedFile {
    pub path: String,
    pub exists: bool,
    pub size: Option<u64>,
    /// Capped preview of file content (see `pmr-executor` for the byte cap).
    pub content_preview: Option<String>,
}

/// Structured outcome of one executor invocation. `status = COMPLETE` is
/// valid only when `verified_files` has at least one `exists = true` entry
/// and `unverified_files` is empty — the Completion Authority invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorResult {
    pub executed: bool,
    pub output: String,
    /// The executor's self-claim. Informational only; never authoritative.
    pub files_modified: Vec<String>,
    pub verified_files: Vec<VerifiedFile>,
    /// Claimed but not confirmed to exist on disk.
    pub unverified_files: Vec<String>,
    pub duration_ms: u64,
    pub status: ExecutorStatus,
    pub working_directory: std::path::PathBuf,
    pub blocked_reason: Option<BlockedReason>,
    pub terminated_by: Option<Terminator>,
    /// Set only when the pre-flight gate refused to spawn (spec.md §4.2,
    /// §8 scenario 6). `executed = false` whenever this is `Some`.
    pub clarification: Option<ClarificationSignal>,
}

impl ExecutorResult {
    /// The Completion Authority invariant, checkable independent of how the
    /// result was produced.
    #[must_use]
    pub fn satisfies_completion_authority(&self) -> bool {
        self.unverified_files.is_empty()
            && self.verified_files.iter().any(|f| f.exists)
    }
}
