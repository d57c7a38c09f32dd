//! Producer settings and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::ProducerConfig;

/// Producer loop settings
#[derive(Debug, Clone, Default)]
pub struct ProducerSettings {
    /// Pause between two enqueue attempts
    pub interval: Option<Duration>,
}

impl ProducerSettings {
    pub fn new(interval: Option<Duration>) -> Self {
        Self { interval }
    }
}

impl From<&ProducerConfig> for ProducerSettings {
    fn from(config: &ProducerConfig) -> Self {
        Self::new(config.interval())
    }
}

/// Producer metrics
#[derive(Debug, Default)]
pub struct ProducerMetrics {
    /// Facts pulled from the source
    pub produced: AtomicU64,

    /// Facts accepted by the queue
    pub accepted: AtomicU64,

    /// Facts rejected because the queue was full
    pub dropped_full: AtomicU64,

    /// Facts rejected because the queue was closed
    pub dropped_closed: AtomicU64,

    /// Source errors (counted as dropped facts)
    pub faults: AtomicU64,
}

impl ProducerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_full(&self) {
        self.dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_closed(&self) {
        self.dropped_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> ProducerMetricsSnapshot {
        ProducerMetricsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            dropped_closed: self.dropped_closed.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerMetricsSnapshot {
    pub produced: u64,
    pub accepted: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
    pub faults: u64,
}

impl ProducerMetricsSnapshot {
    /// Every fact that never made it into the queue, faults included
    pub fn dropped(&self) -> u64 {
        self.dropped_full + self.dropped_closed + self.faults
    }
}
