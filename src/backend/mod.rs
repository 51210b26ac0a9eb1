//! Backend Module
//!
//! All server-side code for the presence coordinator. The backend accepts
//! WebSocket connections from authenticated clients, tracks who is online
//! and who is editing which note, and fans out lock and presence changes
//! to a note's connected collaborators.
//!
//! # Architecture
//!
//! - **`server`** - Initialization, application state, configuration
//! - **`routes`** - HTTP route configuration
//! - **`gateway`** - WebSocket upgrade and per-connection socket loop
//! - **`presence`** - Session registry, note lock table, coordinator
//! - **`notes`** - Read-only note store client and collaborator resolver
//! - **`auth`** - JWT verification seam
//! - **`error`** - Error taxonomy
//!
//! # State Management
//!
//! The session registry and the note lock table are the only mutable
//! shared structures in the process; both live inside the
//! [`presence::Coordinator`] and are mutated exclusively by its command
//! handlers. State is shared with `Arc` and `tokio::sync` locks; lock
//! transitions are serialized per note and never yield mid-transition.
//!
//! # Error Handling
//!
//! Errors use `thiserror` and propagate with `?`. Every error is
//! terminal for the command that produced it, goes to the originating
//! connection only, and is never fatal to the process.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// WebSocket connection gateway
pub mod gateway;

/// Presence and lock state
pub mod presence;

/// Note store access
pub mod notes;

/// Authentication
pub mod auth;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use error::CoordinatorError;
pub use presence::Coordinator;
pub use server::create_app;
