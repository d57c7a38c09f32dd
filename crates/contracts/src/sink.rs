//! FactSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for delivery targets.

use std::time::Instant;

use crate::{ContractError, FactEnvelope};

/// Delivery target trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(FactSink: Send)]
pub trait LocalFactSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Attempt a single delivery of `fact`
    ///
    /// Implementations must return by `deadline` or shortly after; the
    /// dispatcher gives up on the call once the deadline passes.
    ///
    /// # Errors
    /// Returns delivery error (should include context)
    async fn deliver(&mut self, fact: &FactEnvelope, deadline: Instant) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
