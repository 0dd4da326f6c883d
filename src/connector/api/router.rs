use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::container::Container;
use super::controller::{chat_handler, health_handler, index_handler, presentation_handler};

/// HTTP surface of the chat widget.
pub fn create_router(container: Arc<Container>) -> axum::Router {
    axum::Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/presentation", get(presentation_handler))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(container)
}

/// Serves until Ctrl-C, evicting idle sessions in the background.
pub async fn serve(container: Arc<Container>, addr: SocketAddr) -> Result<()> {
    let sweeper = tokio::spawn(container.evict_sessions_use_case().run_periodically());

    let listener = TcpListener::bind(addr).await?;
    info!("Chat UI listening on http://{}", listener.local_addr()?);
    if !container.is_model_available() {
        warn!("Model unavailable: every chat attempt will receive the error message");
    }

    axum::serve(listener, create_router(container))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
