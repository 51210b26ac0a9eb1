//! NoteCollab - Presence & Edit-Lock Coordinator
//!
//! NoteCollab is the real-time coordination backend for a multi-user note
//! editor. It tracks which logged-in users currently hold a live WebSocket
//! connection, which note (if any) each of them is editing, and broadcasts
//! presence and lock changes to the connected collaborators of the affected
//! note.
//!
//! # Overview
//!
//! The crate provides:
//! - A WebSocket gateway accepting persistent duplex connections
//! - A session registry mapping user identities to live connections
//! - A note lock table enforcing first-come-first-served edit locks
//! - A coordinator that serializes lock transitions and fans out
//!   notifications to the right subset of connected collaborators
//!
//! # Module Structure
//!
//! - **`shared`** - Wire-protocol types shared with clients
//!   - Inbound command envelope, outbound notification envelope
//! - **`backend`** - Server-side code
//!   - Axum server setup, WebSocket gateway, coordinator state machine
//!   - JWT authentication, note store client, error types
//!
//! # Usage
//!
//! ```rust,no_run
//! use notecollab::backend::server::{init::create_app, ServerConfig};
//!
//! # async fn example() {
//! let config = ServerConfig::from_env();
//! let app = create_app(config).await;
//! // Use app with Axum server
//! # }
//! ```

/// Types shared between server and clients
pub mod shared;

/// Server-side code
pub mod backend;
