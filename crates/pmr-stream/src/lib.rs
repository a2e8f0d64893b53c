//! Process-scoped, bounded ring buffer for `ExecutorOutputChunk`s.
//!
//! A single buffer backs every session in the process, cleared at session
//! boundaries rather than per-session-allocated — the design notes call
//! this out explicitly as a "global singleton" that must not leak
//! cross-session state. Cross-session contamination is prevented entirely
//! by the `(session_id, task_id, timestamp)` filter triple in
//! [`OutputStream::chunks_for_task`], which fails closed when any part of
//! that context is unavailable.
//!
//! A fixed-chunk-capacity ring buffer with a subscriber model, rather than
//! a fixed-byte-capacity buffer with a single consumer.

use chrono::{DateTime, Utc};
use pmr_types::{ChunkStream, ExecutorOutputChunk, SessionId, TaskId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Text markers that disqualify a chunk regardless of its filter triple
/// matching — residue from a prior process incarnation that happens to
/// share ids is still stale.
const STALENESS_MARKERS: [&str; 3] = [
    "previous session",
    "already cleaned up",
    "stale output",
];

type Subscriber = Box<dyn Fn(&ExecutorOutputChunk) + Send + Sync>;

pub struct OutputStream {
    capacity: usize,
    buffer: Mutex<VecDeque<ExecutorOutputChunk>>,
    subscribers: Mutex<Vec<Subscriber>>,
    next_sequence: AtomicU64,
}

impl OutputStream {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buffer: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
            subscribers: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Next monotonically increasing sequence number for a new chunk.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish a chunk: append it to the ring buffer and notify every
    /// subscriber. A panicking subscriber is caught and logged so it
    /// cannot starve the others (spec.md §5).
    pub fn publish(&self, chunk: ExecutorOutputChunk) {
        {
            let mut buf = self.buffer.lock().expect("stream buffer poisoned");
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(chunk.clone());
        }

        let subscribers = self.subscribers.lock().expect("subscriber list poisoned");
        for subscriber in subscribers.iter() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber(&chunk);
            }));
            if let Err(panic) = result {
                tracing::warn!(?panic, "output stream subscriber panicked; continuing");
            }
        }
    }

    pub fn subscribe(&self, subscriber: Subscriber) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(subscriber);
    }

    /// Reset the buffer at a session boundary. Subscribers are left
    /// registered; only the chunk backlog is cleared.
    pub fn clear(&self) {
        self.buffer.lock().expect("stream buffer poisoned").clear();
    }

    /// Fetch chunks for `task_id` within `session_id`, created at or after
    /// `created_at`, rejecting anything matching a staleness marker.
    /// Missing filter context is never treated permissively: callers must
    /// supply a concrete `session_id`/`created_at`.
    #[must_use]
    pub fn chunks_for_task(
        &self,
        task_id: TaskId,
        session_id: SessionId,
        created_at: DateTime<Utc>,
    ) -> Vec<ExecutorOutputChunk> {
        self.buffer
            .lock()
            .expect("stream buffer poisoned")
            .iter()
            .filter(|chunk| {
                chunk.task_id == task_id
                    && chunk.session_id == session_id
                    && chunk.timestamp >= created_at
                    && !is_stale_text(&chunk.text)
            })
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn stream_kind_count(&self, stream: ChunkStream) -> usize {
        self.buffer
            .lock()
            .expect("stream buffer poisoned")
            .iter()
            .filter(|c| c.stream == stream)
            .count()
    }
}

fn is_stale_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    STALENESS_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(task_id: TaskId, session_id: SessionId, seq: u64, text: &str) -> ExecutorOutputChunk {
        ExecutorOutputChunk {
            timestamp: Utc::now(),
            task_id,
            session_id,
            stream: ChunkStream::Stdout,
            text: text.to_string(),
            sequence: seq,
            project_id: None,
        }
    }

    #[test]
    fn filters_by_task_and_session_and_rejects_stale_text() {
        let stream = OutputStream::new(100);
        let task_id = TaskId::new();
        let session_id = SessionId::new();
        let other_session = SessionId::new();
        let created_at = Utc::now() - chrono::Duration::seconds(1);

        stream.publish(chunk(task_id, session_id, 0, "normal output"));
        stream.publish(chunk(task_id, other_session, 1, "normal output"));
        stream.publish(chunk(task_id, session_id, 2, "previous session leaked output"));

        let result = stream.chunks_for_task(task_id, session_id, created_at);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].sequence, 0);
    }

    #[test]
    fn rejects_chunks_older_than_task_creation() {
        let stream = OutputStream::new(100);
        let task_id = TaskId::new();
        let session_id = SessionId::new();
        let mut old = chunk(task_id, session_id, 0, "old");
        old.timestamp = Utc::now() - chrono::Duration::hours(1);
        stream.publish(old);

        let result = stream.chunks_for_task(task_id, session_id, Utc::now());
        assert!(result.is_empty());
    }

    #[test]
    fn ring_buffer_drops_oldest_past_capacity() {
        let stream = OutputStream::new(2);
        let task_id = TaskId::new();
        let session_id = SessionId::new();
        for i in 0..5 {
            stream.publish(chunk(task_id, session_id, i, "x"));
        }
        let result = stream.chunks_for_task(task_id, session_id, Utc::now() - chrono::Duration::seconds(10));
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].sequence, 3);
        assert_eq!(result[1].sequence, 4);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let stream = OutputStream::new(10);
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let count2 = count.clone();
        stream.subscribe(Box::new(|_| panic!("boom")));
        stream.subscribe(Box::new(move |_| {
            count2.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }));

        stream.publish(chunk(TaskId::new(), SessionId::new(), 0, "hi"));
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_resets_backlog_but_keeps_subscribers() {
        let stream = OutputStream::new(10);
        let task_id = TaskId::new();
        let session_id = SessionId::new();
        stream.publish(chunk(task_id, session_id, 0, "hi"));
        stream.clear();
        let result = stream.chunks_for_task(task_id, session_id, Utc::now() - chrono::Duration::seconds(10));
        assert!(result.is_empty());
    }
}
