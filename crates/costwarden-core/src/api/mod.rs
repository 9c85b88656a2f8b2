//! HTTP surface for the monitor and relay services

pub mod handlers;
pub mod routes;

pub use handlers::{MonitorState, RelayState};
pub use routes::{monitor_router, relay_router};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};

/// Serve `app` on `addr` until ctrl-c
pub async fn serve(app: Router, addr: &str) -> Result<()> {
    let app = app.layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("could not bind {addr}: {e}")))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::config(e.to_string()))?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
