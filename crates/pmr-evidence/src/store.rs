//! Append-only evidence store.
//!
//! Writers are serialized per session; readers are unrestricted (spec.md
//! §5). Persisted as one JSON file per evidence record under
//! `<evidence_root>/<session_id>/evidence/<evidence_id>.json`, a
//! one-file-per-receipt layout.

use pmr_types::{Evidence, EvidenceId, SessionId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::EvidenceError;
use crate::hash::verify_content_hash;

pub struct EvidenceStore {
    root: PathBuf,
    /// One write-serializing mutex per session; append-only writes to
    /// different sessions never block each other.
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl EvidenceStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    fn session_dir(&self, session_id: SessionId) -> PathBuf {
        self.root.join(session_id.to_string()).join("evidence")
    }

    async fn session_lock(&self, session_id: SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append one evidence record. Serialized per session; never mutates an
    /// existing record.
    pub async fn append(&self, session_id: SessionId, evidence: &Evidence) -> Result<PathBuf, EvidenceError> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let dir = self.session_dir(session_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.json", evidence.id));
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(EvidenceError::AtomicOperationViolation(format!(
                "evidence {} already exists; evidence is append-only, not mutable",
                evidence.id
            )));
        }

        let json = serde_json::to_vec_pretty(evidence)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }

    pub async fn read(&self, session_id: SessionId, evidence_id: EvidenceId) -> Result<Evidence, EvidenceError> {
        let path = self.session_dir(session_id).join(format!("{evidence_id}.json"));
        let bytes = tokio::fs::read(&path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn list(&self, session_id: SessionId) -> Result<Vec<Evidence>, EvidenceError> {
        let dir = self.session_dir(session_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let bytes = tokio::fs::read(&path).await?;
                out.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(out)
    }
}

/// Verify that an evidence record's artifacts still match its stamped hash.
#[must_use]
pub fn verify_evidence_hash(evidence: &Evidence) -> bool {
    verify_content_hash(&evidence.artifacts, &evidence.content_hash)
}

#[must_use]
pub fn evidence_root_for(project_evidence_root: &Path, session_id: SessionId) -> PathBuf {
    project_evidence_root.join(session_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::compute_content_hash;
    use chrono::Utc;
    use pmr_types::{Artifact, ExecutorId, OperationType, TaskId};

    fn sample_evidence(task_id: TaskId) -> Evidence {
        let artifacts = vec![Artifact {
            path: "README.md".into(),
            content: Some("# Project".into()),
            size: Some(9),
        }];
        Evidence {
            id: EvidenceId::new(),
            task_id,
            timestamp: Utc::now(),
            operation: OperationType::FileWrite,
            executor_id: ExecutorId::new(),
            content_hash: compute_content_hash(&artifacts),
            artifacts,
            raw_log_ref: None,
            integrity_validated: true,
        }
    }

    #[tokio::test]
    async fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path());
        let session_id = SessionId::new();
        let task_id = TaskId::new();
        let evidence = sample_evidence(task_id);

        store.append(session_id, &evidence).await.unwrap();
        let read_back = store.read(session_id, evidence.id).await.unwrap();
        assert_eq!(read_back.id, evidence.id);
        assert!(verify_evidence_hash(&read_back));
    }

    #[tokio::test]
    async fn append_is_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path());
        let session_id = SessionId::new();
        let evidence = sample_evidence(TaskId::new());

        store.append(session_id, &evidence).await.unwrap();
        let err = store.append(session_id, &evidence).await.unwrap_err();
        assert!(matches!(err, EvidenceError::AtomicOperationViolation(_)));
    }

    #[tokio::test]
    async fn list_returns_all_records_for_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::new(dir.path());
        let session_id = SessionId::new();
        store.append(session_id, &sample_evidence(TaskId::new())).await.unwrap();
        store.append(session_id, &sample_evidence(TaskId::new())).await.unwrap();

        let all = store.list(session_id).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
