//! Web server lifecycle: bind → spawn background task → return handle
//! with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::core_state::{CoreState, StartupError};
use crate::web::router::build_router;

/// Handle to a running web server.
pub struct WebServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WebServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Web server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Web server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve the application router in a background task.
///
/// Port 0 binds an ephemeral port; the chosen address is in `WebServer::addr`.
pub async fn start_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<WebServer, StartupError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(StartupError::Serve)?;

    let app = build_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Web server received shutdown signal");
        };

        tracing::info!(%addr, "Web server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Web server error: {e}");
        }

        tracing::info!("Web server stopped");
    });

    Ok(WebServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
