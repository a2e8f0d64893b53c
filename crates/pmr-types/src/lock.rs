//! FileLock: the data model for the process-wide lock manager.
//!
//! `expires_at` is informational only. The lock manager (`pmr-lock`) must
//! never auto-release a lock based on it; doing so is a reportable
//! integrity failure, not a normal code path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ids::{ExecutorId, LockId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockType {
    /// Shared: multiple readers may hold a READ lock on the same path.
    Read,
    /// Exclusive: a WRITE lock excludes every other lock on the same path.
    Write,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLock {
    pub id: LockId,
    pub file_path: PathBuf,
    pub holder_executor_id: ExecutorId,
    pub acquired_at: DateTime<Utc>,
    /// Informational only. Never consulted for auto-release.
    pub expires_at: DateTime<Utc>,
    pub lock_type: LockType,
}
