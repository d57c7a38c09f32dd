//! Queue error types

use thiserror::Error;

/// Queue construction errors
///
/// Runtime outcomes (full, closed, cancelled) are plain return values, not errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// A zero-capacity queue could never accept an item
    #[error("queue capacity must be > 0")]
    ZeroCapacity,
}
