//! Server Setup
//!
//! Server initialization, application state, and configuration loading.

/// Application assembly
pub mod init;

/// Shared handler state
pub mod state;

/// Environment configuration
pub mod config;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
