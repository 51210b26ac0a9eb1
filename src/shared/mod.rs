//! Shared Module
//!
//! This module contains the wire-protocol types exchanged between the
//! coordinator and its clients over the WebSocket connection. Both
//! directions use a small tagged JSON envelope; the command set and fields
//! are the contract, the framing is plain text frames.

/// Inbound command envelope
pub mod command;

/// Outbound notification envelope
pub mod notify;

/// Re-export commonly used types for convenience
pub use command::{Command, NoteId, UserIdentity};
pub use notify::Outbound;
