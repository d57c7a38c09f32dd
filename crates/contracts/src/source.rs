//! FactSource trait - Producer input interface
//!
//! Decouples fact generation from the queueing logic so the producer can be
//! fed by a synthetic generator, a file or any upstream system.

use crate::{ContractError, Fact};

/// Fact data source trait
#[trait_variant::make(FactSource: Send)]
pub trait LocalFactSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Produce the next fact
    ///
    /// Returns `Ok(None)` once the source is exhausted. An `Err` is a
    /// per-item fault; the caller may keep pulling afterwards.
    async fn next_fact(&mut self) -> Result<Option<Fact>, ContractError>;
}
