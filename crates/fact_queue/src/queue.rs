//! BoundedQueue - fixed-capacity FIFO with non-blocking enqueue

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::QueueError;
use crate::metrics::QueueMetrics;

/// Outcome of a non-blocking enqueue attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// Item is now owned by the queue
    Accepted,
    /// Item was discarded
    Dropped(DropReason),
}

impl Enqueue {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Why an enqueue attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Queue held `capacity` items (backpressure)
    Full,
    /// Write side already closed (shutdown race)
    Closed,
}

impl DropReason {
    /// Metric / log label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Closed => "closed",
        }
    }
}

/// Outcome of a dequeue
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued<T> {
    /// Next item in FIFO order
    Item(T),
    /// Queue is closed and fully drained; terminal
    Closed,
    /// Cancellation token fired before an item was taken
    Cancelled,
}

/// Bounded multi-producer / multi-consumer queue
///
/// Handles are cheap to clone and all share one buffer. The queue never
/// closes by itself: only an explicit [`BoundedQueue::close`] ends the stream,
/// even when every producer handle is dropped.
pub struct BoundedQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    capacity: usize,
    metrics: Arc<QueueMetrics>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
            capacity: self.capacity,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<T> std::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        let (tx, rx) = async_channel::bounded(capacity);
        Ok(Self {
            tx,
            rx,
            capacity,
            metrics: Arc::new(QueueMetrics::new()),
        })
    }

    /// Try to enqueue without waiting
    ///
    /// Safe to call from any number of tasks concurrently and after
    /// [`close`](Self::close); a closed queue reports `Dropped(Closed)`.
    pub fn try_enqueue(&self, item: T) -> Enqueue {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.metrics.inc_accepted();
                self.metrics.set_depth(self.tx.len());
                trace!(depth = self.tx.len(), "item accepted");
                Enqueue::Accepted
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.inc_dropped_full();
                trace!(capacity = self.capacity, "queue full, item dropped");
                Enqueue::Dropped(DropReason::Full)
            }
            Err(TrySendError::Closed(_)) => {
                self.metrics.inc_dropped_closed();
                trace!("queue closed, item dropped");
                Enqueue::Dropped(DropReason::Closed)
            }
        }
    }

    /// Wait for the next item
    ///
    /// Cancellation wins over buffered items: once `cancel` has fired this
    /// returns `Cancelled` even if items remain. Items left behind stay in
    /// the buffer and are dropped with the last handle.
    pub async fn dequeue(&self, cancel: &CancellationToken) -> Dequeued<T> {
        if cancel.is_cancelled() {
            return Dequeued::Cancelled;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Dequeued::Cancelled,
            received = self.rx.recv() => match received {
                Ok(item) => {
                    self.metrics.inc_dequeued();
                    self.metrics.set_depth(self.rx.len());
                    Dequeued::Item(item)
                }
                Err(_) => Dequeued::Closed,
            },
        }
    }

    /// Close the write side
    ///
    /// Returns `true` for the call that closed the queue. Later calls are
    /// ignored and return `false`.
    pub fn close(&self) -> bool {
        if self.tx.close() {
            debug!(remaining = self.len(), "queue closed");
            true
        } else {
            warn!("queue already closed, ignoring close request");
            false
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Items currently buffered
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<QueueMetrics> {
        &self.metrics
    }
}
