//! HTTP surface: `POST /predict` and `GET /health`.

mod error;
mod routes;
mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, ModelSettings};

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Bind `addr` and serve until Ctrl+C.
pub async fn serve(state: Arc<AppState>, addr: &str, body_limit_bytes: usize) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(|e| Error::Bind {
        addr: addr.to_string(),
        source: e,
    })?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state, body_limit_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
