//! Health probe server using Axum.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use somali_bot_core::BotAssistant;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Liveness probe.
async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Circuit breaker state of both upstreams.
async fn handle_status(State(assistant): State<Arc<BotAssistant>>) -> impl IntoResponse {
    Json(assistant.health())
}

fn router(assistant: Arc<BotAssistant>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(assistant)
}

/// Start the health server in the background.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    assistant: Arc<BotAssistant>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Health server listening on {}", actual_addr);

    let app = router(assistant);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Health server error: {}", e);
        }
    });

    Ok(actual_addr)
}
