//! Backend Error Types
//!
//! Error taxonomy for the coordinator. Every error is terminal for the
//! single command that produced it and is delivered to the originating
//! connection only, never broadcast.

/// Error type definitions
pub mod types;

pub use types::{CoordinatorError, NoteStoreError};
