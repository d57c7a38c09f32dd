//! Queue counters for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared by every handle of one queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Items currently buffered (approximate under concurrency)
    depth: AtomicUsize,
    /// Total accepted enqueues
    accepted: AtomicU64,
    /// Enqueues rejected because the queue was full
    dropped_full: AtomicU64,
    /// Enqueues rejected because the queue was closed
    dropped_closed: AtomicU64,
    /// Items handed to a consumer
    dequeued: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    pub fn set_depth(&self, depth: usize) {
        self.depth.store(depth, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn inc_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_full(&self) -> u64 {
        self.dropped_full.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_full(&self) {
        self.dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_closed(&self) -> u64 {
        self.dropped_closed.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_closed(&self) {
        self.dropped_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    pub fn inc_dequeued(&self) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            depth: self.depth(),
            accepted: self.accepted(),
            dropped_full: self.dropped_full(),
            dropped_closed: self.dropped_closed(),
            dequeued: self.dequeued(),
        }
    }
}

/// Snapshot of queue counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueMetricsSnapshot {
    pub depth: usize,
    pub accepted: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
    pub dequeued: u64,
}

impl QueueMetricsSnapshot {
    /// All rejected enqueues regardless of reason
    pub fn dropped(&self) -> u64 {
        self.dropped_full + self.dropped_closed
    }
}
