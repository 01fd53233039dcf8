use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{hello, process, result_object};
use crate::core::AppState;

/// All routes with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/api/v1/process", post(process))
        .route("/results/{key}", get(result_object))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(state.config().socket_addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
