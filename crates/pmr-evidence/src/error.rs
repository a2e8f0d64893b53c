use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("integrity failure: evidence {0} hash does not match its artifacts")]
    IntegrityFailure(pmr_types::EvidenceId),

    #[error("missing evidence for claimed operation on task {0}")]
    MissingEvidence(pmr_types::TaskId),

    #[error("atomic-operation violation: {0}")]
    AtomicOperationViolation(String),

    #[error("failed to persist evidence record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize evidence record: {0}")]
    Serialize(#[from] serde_json::Error),
}
