//! ShutdownCoordinator - one-shot shutdown state machine

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

use fact_queue::BoundedQueue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Something whose write side the coordinator closes on trigger
pub trait IntakeGate: Send + Sync {
    /// Stop accepting new work. Returns `false` if already closed.
    fn close_intake(&self) -> bool;
}

impl<T: Send> IntakeGate for BoundedQueue<T> {
    fn close_intake(&self) -> bool {
        self.close()
    }
}

/// What caused the shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / SIGTERM
    Signal,
    /// Explicit [`ShutdownCoordinator::cancel`]
    Requested,
    /// Run timeout elapsed
    Timeout,
    /// Producer ran out of facts
    SourceExhausted,
    /// Pipeline finished before anything triggered
    Completed,
}

impl ShutdownReason {
    /// Metric / log label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Requested => "requested",
            Self::Timeout => "timeout",
            Self::SourceExhausted => "source_exhausted",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to buffered facts once shutdown is triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Cancel the dispatcher immediately; buffered facts are abandoned
    #[default]
    Abandon,
    /// Let the dispatcher drain the closed queue for at most `grace`
    Drain { grace: Duration },
}

impl DrainPolicy {
    /// `None` maps to [`DrainPolicy::Abandon`]
    pub fn from_grace(grace: Option<Duration>) -> Self {
        match grace {
            Some(grace) => Self::Drain { grace },
            None => Self::Abandon,
        }
    }
}

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Armed,
    Triggered,
    Complete,
}

const ARMED: u8 = 0;
const TRIGGERED: u8 = 1;
const COMPLETE: u8 = 2;

impl ShutdownState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            ARMED => Self::Armed,
            TRIGGERED => Self::Triggered,
            _ => Self::Complete,
        }
    }
}

/// One-shot shutdown coordinator
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct ShutdownCoordinator {
    state: AtomicU8,
    reason: OnceLock<ShutdownReason>,
    policy: DrainPolicy,
    /// Observed by the dispatcher; root token
    dispatch: CancellationToken,
    /// Observed by producers; child of `dispatch`
    intake: CancellationToken,
    gate: Box<dyn IntakeGate>,
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("state", &self.state())
            .field("reason", &self.reason())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ShutdownCoordinator {
    pub fn new(gate: impl IntakeGate + 'static, policy: DrainPolicy) -> Self {
        let dispatch = CancellationToken::new();
        let intake = dispatch.child_token();
        Self {
            state: AtomicU8::new(ARMED),
            reason: OnceLock::new(),
            policy,
            dispatch,
            intake,
            gate: Box::new(gate),
        }
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Reason recorded by the triggering call
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }

    /// Token for producers
    pub fn intake_token(&self) -> CancellationToken {
        self.intake.clone()
    }

    /// Token for the dispatcher
    pub fn dispatch_token(&self) -> CancellationToken {
        self.dispatch.clone()
    }

    /// Fire the shutdown
    ///
    /// Only the first call has any effect and returns `true`.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        if self
            .state
            .compare_exchange(ARMED, TRIGGERED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(reason = %reason, state = ?self.state(), "shutdown already triggered, ignoring");
            return false;
        }

        let _ = self.reason.set(reason);
        info!(reason = %reason, policy = ?self.policy, "shutdown triggered");
        observability::record_shutdown(reason.as_str());

        self.intake.cancel();
        self.gate.close_intake();
        if self.policy == DrainPolicy::Abandon {
            self.dispatch.cancel();
        }
        true
    }

    /// Request shutdown from code
    pub fn cancel(&self) -> bool {
        self.trigger(ShutdownReason::Requested)
    }

    /// Shutdown listener
    ///
    /// Waits for `signal` or for a trigger from elsewhere, then enforces the
    /// drain policy. Returns once the dispatch token is cancelled.
    #[instrument(name = "shutdown_listener", skip_all)]
    pub async fn listen<F>(&self, signal: F)
    where
        F: Future<Output = ShutdownReason>,
    {
        tokio::select! {
            reason = signal => {
                self.trigger(reason);
            }
            _ = self.intake.cancelled() => {}
        }

        match self.policy {
            DrainPolicy::Abandon => {}
            DrainPolicy::Drain { grace } => {
                tokio::select! {
                    _ = tokio::time::sleep(grace) => {
                        warn!(grace_ms = grace.as_millis() as u64, "drain grace elapsed, abandoning remaining facts");
                        self.dispatch.cancel();
                    }
                    _ = self.dispatch.cancelled() => {}
                }
            }
        }
        debug!("shutdown listener finished");
    }

    /// Mark shutdown complete after every task has been joined
    ///
    /// Triggers first (reason `Completed`) if still armed. Returns `false` if
    /// already complete.
    pub fn complete(&self) -> bool {
        if self.state() == ShutdownState::Armed {
            self.trigger(ShutdownReason::Completed);
        }

        match self
            .state
            .compare_exchange(TRIGGERED, COMPLETE, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                // releases a listener still waiting out the drain grace
                self.dispatch.cancel();
                info!(reason = ?self.reason(), "shutdown complete");
                true
            }
            Err(_) => {
                warn!("shutdown already complete");
                false
            }
        }
    }
}
