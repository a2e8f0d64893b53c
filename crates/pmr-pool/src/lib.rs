//! Fixed-capacity agent pools (L1 sub-agents, L2 executors).
//!
//! Acquisition beyond capacity fails immediately with
//! [`PoolError::LimitExceeded`]; callers must not queue indefinitely
//! (spec.md §5). Uses the same explicit try-acquire, immediate-failure,
//! no-blocking-wait pattern as this project's file lock manager,
//! generalized here from a single exclusive slot to N slots via
//! `tokio::sync::Semaphore::try_acquire`.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Semaphore, TryAcquireError};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("executor pool at capacity ({capacity}); acquisition refused rather than queued")]
    LimitExceeded { capacity: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTier {
    /// L1: sub-agents.
    SubAgent,
    /// L2: executors (one Claude Code CLI invocation each).
    Executor,
}

pub struct AgentPool {
    tier: PoolTier,
    capacity: usize,
    semaphore: Arc<Semaphore>,
}

/// RAII guard: dropping it releases the slot back to the pool.
pub struct PoolGuard {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl AgentPool {
    #[must_use]
    pub fn new(tier: PoolTier, capacity: usize) -> Self {
        Self {
            tier,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    #[must_use]
    pub const fn tier(&self) -> PoolTier {
        self.tier
    }

    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Non-blocking acquisition. Fails immediately rather than waiting when
    /// the pool is at capacity.
    pub fn try_acquire(&self) -> Result<PoolGuard, PoolError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(PoolGuard { _permit: permit }),
            Err(TryAcquireError::NoPermits) => Err(PoolError::LimitExceeded {
                capacity: self.capacity,
            }),
            Err(TryAcquireError::Closed) => Err(PoolError::LimitExceeded {
                capacity: self.capacity,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_up_to_capacity_then_fails_fast() {
        let pool = AgentPool::new(PoolTier::Executor, 2);
        let g1 = pool.try_acquire().unwrap();
        let g2 = pool.try_acquire().unwrap();
        let err = pool.try_acquire().unwrap_err();
        assert_eq!(err, PoolError::LimitExceeded { capacity: 2 });
        drop(g1);
        drop(g2);
    }

    #[test]
    fn releasing_a_guard_frees_a_slot() {
        let pool = AgentPool::new(PoolTier::SubAgent, 1);
        let guard = pool.try_acquire().unwrap();
        assert_eq!(pool.available(), 0);
        drop(guard);
        assert_eq!(pool.available(), 1);
        pool.try_acquire().unwrap();
    }
}
