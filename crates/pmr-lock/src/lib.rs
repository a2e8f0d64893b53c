//! Process-wide file lock manager, keyed by absolute path.
//!
//! Acquisition is explicit and non-blocking: a conflicting request returns
//! immediately with [`LockError::Conflict`] rather than waiting. There is no
//! background sweeper and `expires_at` is never consulted for release: the
//! data model here makes "no auto-release" a load-bearing invariant (§3,
//! §8), deliberately forgoing the TTL-sweep a file lock manager would
//! otherwise carry. See DESIGN.md.

use chrono::{Duration as ChronoDuration, Utc};
use pmr_types::{ExecutorId, FileLock, LockId, LockType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LockError {
    #[error("lock conflict on {path}: held as {held_as:?} by another executor")]
    Conflict {
        path: PathBuf,
        held_as: LockType,
    },

    #[error("no lock {lock_id} held on {path} by executor {holder}")]
    NotHeld {
        path: PathBuf,
        lock_id: LockId,
        holder: ExecutorId,
    },

    /// Raised if any caller attempts to release a lock based on
    /// `expires_at` rather than an explicit holder request. Reportable
    /// integrity failure per the data model invariant, not a normal path.
    #[error("refused auto-release of lock {0} based on expires_at: this is an integrity failure")]
    AutoReleaseAttempted(LockId),
}

/// Default informational expiry horizon stamped on new locks. Never
/// consulted to decide release.
const DEFAULT_INFORMATIONAL_TTL_SECS: i64 = 3600;

#[derive(Default)]
pub struct LockManager {
    held: Mutex<HashMap<PathBuf, Vec<FileLock>>>,
}

impl LockManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit, non-blocking acquisition. READ locks may share with other
    /// READ locks; a WRITE lock excludes every other lock on the path.
    pub fn acquire(
        &self,
        path: &Path,
        holder: ExecutorId,
        lock_type: LockType,
    ) -> Result<LockId, LockError> {
        let mut held = self.held.lock().expect("lock manager mutex poisoned");
        let entries = held.entry(path.to_path_buf()).or_default();

        let conflict = entries.iter().any(|existing| {
            matches!(
                (existing.lock_type, lock_type),
                (LockType::Write, _) | (_, LockType::Write)
            )
        });
        if conflict {
            let held_as = entries[0].lock_type;
            return Err(LockError::Conflict {
                path: path.to_path_buf(),
                held_as,
            });
        }

        let id = LockId::new();
        let now = Utc::now();
        entries.push(FileLock {
            id,
            file_path: path.to_path_buf(),
            holder_executor_id: holder,
            acquired_at: now,
            expires_at: now + ChronoDuration::seconds(DEFAULT_INFORMATIONAL_TTL_SECS),
            lock_type,
        });
        Ok(id)
    }

    /// Release is only valid when requested by the lock's own holder,
    /// identified by id. There is no path that releases by `expires_at`.
    pub fn release(
        &self,
        path: &Path,
        lock_id: LockId,
        requester: ExecutorId,
    ) -> Result<(), LockError> {
        let mut held = self.held.lock().expect("lock manager mutex poisoned");
        let Some(entries) = held.get_mut(path) else {
            return Err(LockError::NotHeld {
                path: path.to_path_buf(),
                lock_id,
                holder: requester,
            });
        };

        let before = entries.len();
        entries.retain(|l| !(l.id == lock_id && l.holder_executor_id == requester));
        if entries.len() == before {
            return Err(LockError::NotHeld {
                path: path.to_path_buf(),
                lock_id,
                holder: requester,
            });
        }
        if entries.is_empty() {
            held.remove(path);
        }
        Ok(())
    }

    /// Diagnostic-only view of currently held locks; callers are
    /// responsible for leaked locks (spec.md §5) — this never releases.
    #[must_use]
    pub fn held_locks(&self) -> Vec<FileLock> {
        self.held
            .lock()
            .expect("lock manager mutex poisoned")
            .values()
            .flatten()
            .cloned()
            .collect()
    }
}
