//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the relay.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Ownership model
//! - A `Fact` is created by a producer, moved into the queue on accept,
//!   moved out by the dispatcher and dropped after one delivery attempt
//! - `seq` on `FactEnvelope` is assigned by the producer for diagnostics only

mod blueprint;
mod error;
mod fact;
mod sink;
mod source;

pub use blueprint::*;
pub use error::*;
pub use fact::*;
pub use sink::*;
pub use source::*;
