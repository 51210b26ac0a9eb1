//! Presence & Edit-Lock State
//!
//! The only mutable shared structures in the process live here: the
//! session registry (identity → live connection) and the note lock table
//! (note → lock holder). Both are ephemeral; a restart starts empty and
//! clients re-authenticate and re-query lock status.

/// Identity to connection mapping
pub mod registry;

/// Note edit-lock table
pub mod locks;

/// Command processing state machine
pub mod coordinator;

pub use coordinator::Coordinator;
pub use locks::{LockState, NoteLockTable, ReleaseOutcome};
pub use registry::{ConnectionHandle, SessionRegistry};
