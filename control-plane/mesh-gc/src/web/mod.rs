use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cleanup::WebhookCleanup;

async fn readyz(State(cleanup): State<Arc<WebhookCleanup>>) -> (StatusCode, &'static str) {
    if cleanup.done() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "cleanup pending")
    }
}

/// `/healthz` always answers; `/readyz` only once the startup cleanup has
/// finished.
pub fn router(cleanup: Arc<WebhookCleanup>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readyz))
        .with_state(cleanup)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(
    addr: SocketAddr,
    cleanup: Arc<WebhookCleanup>,
    stop: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(cleanup);
    info!("health server listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async move { stop.cancelled().await })
        .await?;
    Ok(())
}
