use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("failed to spawn executor process: {reason}")]
    SpawnFailed { reason: String },

    #[error("failed to write prompt to executor stdin: {reason}")]
    StdinWriteFailed { reason: String },

    #[error("overall timeout of {timeout_ms}ms exceeded")]
    OverallTimeout { timeout_ms: u64 },

    #[error("interactive prompt detected in executor output: {matched}")]
    InteractiveBlock { matched: String },

    #[error("executor requires stdin that the runner will never supply")]
    StdinRequiredBlock,

    #[error("project path invalid: {0}")]
    Config(#[from] pmr_config::ConfigError),

    #[error("failed to snapshot project directory: {0}")]
    Snapshot(#[from] std::io::Error),
}
