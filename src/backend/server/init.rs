//! Server Initialization
//!
//! Wires the coordinator together: configuration, note store, auth
//! service, and the router. Presence state always starts empty; there is
//! nothing to restore.

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::service::JwtAuthService;
use crate::backend::presence::coordinator::Coordinator;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_note_store, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application.
///
/// 1. Connect the read-only note store (or fall back to in-memory)
/// 2. Build the coordinator with the JWT auth service
/// 3. Assemble the router
///
/// The caller loads the configuration once (see
/// [`ServerConfig::from_env`]) and keeps it for things outside the
/// router, like the listen address.
pub async fn create_app(config: ServerConfig) -> Router<()> {
    tracing::info!("Initializing presence coordinator");

    if config.release_locks_on_disconnect {
        tracing::info!("release-on-disconnect lock policy is enabled");
    }

    let note_store = load_note_store().await;
    let auth = Arc::new(JwtAuthService::new());

    let coordinator = Coordinator::new(note_store, auth, config.release_locks_on_disconnect);

    tracing::info!("Presence state initialized (empty)");

    let app_state = AppState::new(coordinator, config);
    create_router(app_state)
}
