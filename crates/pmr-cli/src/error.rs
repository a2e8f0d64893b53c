//! Aggregated top-level error type: each lower-level error type gets a
//! `#[from]` arm, mapped to an exit code for `main.rs` to return. Session outcomes
//! (COMPLETE/ERROR/INCOMPLETE/NO_EVIDENCE/INVALID) are reported separately
//! via their own 0/1/2/3 mapping (spec.md §6) since they are not failures
//! of the runner itself; this type covers everything that prevents a
//! session from running or producing a verdict at all.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PmRunnerError {
    #[error(transparent)]
    Config(#[from] pmr_config::ConfigError),

    #[error(transparent)]
    Lifecycle(#[from] pmr_lifecycle::LifecycleError),

    #[error(transparent)]
    Executor(#[from] pmr_executor::error::ExecutorError),

    #[error(transparent)]
    Evidence(#[from] pmr_evidence::EvidenceError),

    #[error(transparent)]
    Completion(#[from] pmr_completion::CompletionError),

    #[error(transparent)]
    Review(#[from] pmr_review::ReviewError),

    #[error("session {0} not found under the evidence root")]
    SessionNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl PmRunnerError {
    /// Every variant here represents the runner failing to *produce* a
    /// verdict at all, as opposed to producing one the caller dislikes —
    /// so they all map to the generic ERROR exit code, leaving 2/3 free for
    /// an actual session outcome (see `protocol::exit_code_for_status`).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        1
    }
}
