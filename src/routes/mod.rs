//! Local dev backend that speaks the chat stream wire format.

pub mod chat_routes;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::API_PREFIX;
use chat_routes::{chat_handler, health_handler};

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(&format!("{API_PREFIX}/chat"), post(chat_handler))
        .layer(TraceLayer::new_for_http())
}

/// Serves the dev backend on an already-bound listener until the task is dropped.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Dev chat backend listening on http://{addr}/");
    }
    axum::serve(listener, router()).await
}
