//! Graceful shutdown and signal handling.
//!
//! Shutdown starts on the first of:
//! - SIGINT (Ctrl+C)
//! - SIGTERM
//! - an explicit stop from the owning `ServerHandle` (or the handle being dropped)

use std::time::Duration;

use axum_server::Handle;
use tokio::sync::oneshot;

/// Setup graceful shutdown on SIGINT, SIGTERM and an explicit stop.
///
/// When triggered, the server stops accepting new connections and waits up to
/// `timeout` for in-flight requests. Connections still open at the deadline
/// are closed.
pub(super) fn setup_shutdown_handler(
    handle: Handle,
    stop: oneshot::Receiver<()>,
    timeout: Duration,
) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
            _ = stop => {
                tracing::info!("Stop requested, initiating graceful shutdown");
            }
        }

        handle.graceful_shutdown(Some(timeout));
        tracing::info!(
            timeout_secs = timeout.as_secs(),
            "Graceful shutdown initiated, waiting for connections to close"
        );
    });
}
