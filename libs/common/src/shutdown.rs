//! Graceful shutdown utilities
//!
//! Process-level signal handling for the supervisor side of a service. The
//! returned [`ShutdownSignal`] tells the caller which signal ended the wait.

use tracing::warn;

/// Signal that triggered a shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// Ctrl+C (SIGINT)
    Interrupt,
    /// SIGTERM (Unix only)
    Terminate,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// # Example
///
/// ```ignore
/// tokio::select! {
///     sig = common::shutdown::wait_for_shutdown() => {
///         info!("{} received", sig);
///     }
///     // ... other tasks
/// }
/// ```
pub async fn wait_for_shutdown() -> ShutdownSignal {
    wait_for_signal().await
}

#[cfg(unix)]
async fn wait_for_signal() -> ShutdownSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let term_signal = match signal(SignalKind::terminate()) {
        Ok(sig) => Some(sig),
        Err(e) => {
            warn!(
                "Failed to install SIGTERM handler: {}. Service will only respond to Ctrl+C",
                e
            );
            None
        },
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => ShutdownSignal::Interrupt,
        _ = async {
            if let Some(mut sig) = term_signal {
                sig.recv().await;
            } else {
                // Without a SIGTERM handler only Ctrl+C can end the wait
                std::future::pending::<()>().await
            }
        } => ShutdownSignal::Terminate,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
    }
    ShutdownSignal::Interrupt
}
