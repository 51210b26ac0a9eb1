//! Note Store Access
//!
//! Notes, categories, and collaborator lists are owned by the product's
//! CRUD backend and its database. The coordinator only ever *reads* two
//! things from that world: the collaborator set of a note and its title.
//! This module holds the narrow read-through client and the resolver the
//! coordinator queries before every broadcast.

/// The read-only store interface and its implementations
pub mod store;

/// Collaborator resolution for broadcast targeting
pub mod resolver;

pub use resolver::CollaboratorResolver;
pub use store::{InMemoryNoteStore, NoteStore, PgNoteStore};
