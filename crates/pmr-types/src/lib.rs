//! Shared data model for the pm-runner task-execution runner.
//!
//! This crate has no I/O and no async: it is the vocabulary every other
//! `pmr-*` crate builds on, kept deliberately free of behavior so the
//! Session -> Task -> Evidence -> Session reference cycle can be expressed
//! by id rather than by object graph.

pub mod clarification;
pub mod evidence;
pub mod executor;
pub mod ids;
pub mod lock;
pub mod logging;
pub mod phase;
pub mod session;
pub mod stream;
pub mod task;

pub use clarification::{ClarificationReason, ClarificationSignal};
pub use evidence::{Artifact, Evidence, OperationType};
pub use executor::{BlockedReason, ExecutorResult, ExecutorStatus, Terminator, VerifiedFile};
pub use ids::{EvidenceId, ExecutorId, LockId, RunId, SessionId, TaskId, TaskLogId, ThreadId};
pub use lock::{FileLock, LockType};
pub use logging::{Run, RunStatus, TaskLog, TaskLogEventType, Thread, ThreadKind, Visibility};
pub use phase::Phase;
pub use session::{Session, SessionStatus};
pub use stream::{ChunkStream, ExecutorOutputChunk};
pub use task::{GranularityLimits, Task, TaskStatus, TaskType};
