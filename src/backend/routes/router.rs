//! Router Configuration
//!
//! The coordinator exposes a deliberately small HTTP surface: the
//! WebSocket upgrade endpoint and a health probe. The product's CRUD
//! routes (notes, categories, collaborators, auth) live in the separate
//! REST backend and are not part of this process.

use axum::{http::StatusCode, routing::get, Router};

use crate::backend::gateway::handler::ws_upgrade;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured.
///
/// - `GET /ws` - WebSocket upgrade for the presence protocol
/// - `GET /health` - liveness probe
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/health", get(health))
        .fallback(fallback)
        .with_state(app_state)
}

async fn health() -> &'static str {
    "ok"
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}
