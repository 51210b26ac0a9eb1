//! Application State Management
//!
//! `AppState` is the central state container handed to Axum handlers. It
//! holds the coordinator (which owns the session registry and lock table)
//! and the runtime configuration. `FromRef` implementations let handlers
//! extract just the part they need.
//!
//! All registry and lock state is process-memory only; on restart the
//! server comes up empty and clients re-authenticate and re-query lock
//! status.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::presence::coordinator::Coordinator;
use crate::backend::server::config::ServerConfig;

/// Shared state for all connection handlers.
#[derive(Clone)]
pub struct AppState {
    /// The command-processing core; owns registry and lock table.
    pub coordinator: Arc<Coordinator>,
    /// Runtime settings (timeouts, disconnect policy).
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(coordinator: Coordinator, config: ServerConfig) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            config: Arc::new(config),
        }
    }
}

/// Allow handlers to extract the coordinator directly.
impl FromRef<AppState> for Arc<Coordinator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.coordinator.clone()
    }
}

/// Allow handlers to extract the configuration directly.
impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
