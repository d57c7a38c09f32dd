//! Termination triggers fed to [`ShutdownCoordinator::listen`](crate::ShutdownCoordinator::listen)

use std::time::Duration;

use tracing::{error, warn};

use crate::ShutdownReason;

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that fails to install is logged and never fires; the other one
/// keeps working.
pub async fn termination_signal() -> ShutdownReason {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C"),
        _ = terminate => warn!("Received SIGTERM"),
    }
    ShutdownReason::Signal
}

/// Resolves after `after`
pub async fn run_timeout(after: Duration) -> ShutdownReason {
    tokio::time::sleep(after).await;
    warn!(timeout_secs = after.as_secs_f64(), "Run timeout reached");
    ShutdownReason::Timeout
}

/// OS signal, or the run timeout when one is set
pub async fn shutdown_signal(timeout: Option<Duration>) -> ShutdownReason {
    match timeout {
        Some(after) => {
            tokio::select! {
                reason = termination_signal() => reason,
                reason = run_timeout(after) => reason,
            }
        }
        None => termination_signal().await,
    }
}
