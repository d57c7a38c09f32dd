//! # Lifecycle
//!
//! Cooperative shutdown for the relay.
//!
//! A [`ShutdownCoordinator`] fires exactly once (`Armed → Triggered → Complete`).
//! Triggering cancels the intake token seen by producers and closes the
//! queue's write side. The dispatch token is cancelled right away under
//! [`DrainPolicy::Abandon`], or after the grace period under
//! [`DrainPolicy::Drain`].
//!
//! ```ignore
//! let coordinator = Arc::new(ShutdownCoordinator::new(queue.clone(), DrainPolicy::Abandon));
//! let listener = {
//!     let coordinator = Arc::clone(&coordinator);
//!     tokio::spawn(async move { coordinator.listen(lifecycle::signal::shutdown_signal(None)).await })
//! };
//! // ... spawn producer / dispatcher with intake_token() / dispatch_token()
//! coordinator.complete();
//! ```

mod coordinator;
pub mod signal;

pub use coordinator::{
    DrainPolicy, IntakeGate, ShutdownCoordinator, ShutdownReason, ShutdownState,
};
pub use tokio_util::sync::CancellationToken;
