//! HTTP server startup logic.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::HttpServerConfig;

use super::shutdown;

/// Server startup and runtime error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(String),
}

/// Owned handle to a listening server.
///
/// Dropping the handle starts a graceful shutdown.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests to drain.
    ///
    /// Connections still open after `shutdown_timeout_seconds` are closed.
    pub async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        join(self.task).await
    }

    /// Run until a shutdown signal arrives and the server has drained.
    pub async fn wait(mut self) -> Result<(), ServerError> {
        let _stop_tx = self.stop_tx.take();
        join(self.task).await
    }
}

async fn join(task: JoinHandle<std::io::Result<()>>) -> Result<(), ServerError> {
    match task.await {
        Ok(result) => {
            result?;
            tracing::info!("Server stopped");
            Ok(())
        }
        Err(e) => Err(ServerError::Task(e.to_string())),
    }
}

/// Bind the listener and start serving `app` in the background.
///
/// Returns once the listener is bound, so a port conflict is reported here
/// rather than from inside the server task.
pub async fn start_server(
    app: Router,
    config: &HttpServerConfig,
) -> Result<ServerHandle, ServerError> {
    let addr = config.bind_address();
    let bind_error = |source| ServerError::Bind {
        addr: addr.clone(),
        source,
    };

    let socket_addr = tokio::net::lookup_host(addr.as_str())
        .await
        .map_err(bind_error)?
        .next()
        .ok_or_else(|| {
            bind_error(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "host resolved to no addresses",
            ))
        })?;

    let handle = Handle::new();
    let server = axum_server::bind(socket_addr).handle(handle.clone());
    let task = tokio::spawn(async move { server.serve(app.into_make_service()).await });

    // `listening` yields None when the bind failed; the task holds the cause.
    let Some(local_addr) = handle.listening().await else {
        let source = match task.await {
            Ok(Err(e)) => e,
            Ok(Ok(())) => std::io::Error::new(
                std::io::ErrorKind::Other,
                "server exited before listening",
            ),
            Err(e) => return Err(ServerError::Task(e.to_string())),
        };
        return Err(bind_error(source));
    };

    tracing::info!(
        %local_addr,
        "Server is running at http://localhost:{}",
        local_addr.port()
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    shutdown::setup_shutdown_handler(
        handle,
        stop_rx,
        Duration::from_secs(config.shutdown_timeout_seconds),
    );

    Ok(ServerHandle {
        local_addr,
        stop_tx: Some(stop_tx),
        task,
    })
}
