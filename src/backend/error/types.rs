//! Coordinator Error Types
//!
//! This module defines the error taxonomy for command processing. Variants
//! map one-to-one onto outbound `error` envelopes; the stable `code` string
//! is part of the client contract.
//!
//! A send to a disconnected peer is deliberately *not* represented here:
//! dropped sends are swallowed at the gateway and never surface to
//! business logic.

use thiserror::Error;

use crate::shared::command::{NoteId, UserIdentity};
use crate::shared::notify::Outbound;

/// Failure of a note store read (collaborator list or title lookup).
///
/// The store is an external system; all its failure modes collapse into
/// one opaque message by the time they reach the coordinator.
#[derive(Debug, Clone, Error)]
#[error("note store error: {0}")]
pub struct NoteStoreError(pub String);

impl From<sqlx::Error> for NoteStoreError {
    fn from(err: sqlx::Error) -> Self {
        NoteStoreError(err.to_string())
    }
}

/// Errors produced while processing a single command.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Invalid or missing credential proof. The connection stays open and
    /// no state is mutated.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A lock-bearing command arrived before a successful `authenticate`.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Acquisition attempted on an already-held note.
    #[error("Note {note_id} is locked: {status}")]
    LockConflict {
        note_id: NoteId,
        holder: UserIdentity,
        /// The holder's display status, e.g. `"Ada is editing this note"`.
        status: String,
    },

    /// Release attempted by someone other than the holder.
    #[error("Note {note_id} is locked by another user")]
    LockHeldByOther { note_id: NoteId },

    /// Malformed or unrecognized inbound frame.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Collaborator or title lookup against the note store failed.
    #[error("Collaborator lookup failed: {0}")]
    Resolver(#[from] NoteStoreError),
}

impl CoordinatorError {
    /// Stable machine-readable code for the outbound envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth_failed",
            Self::NotAuthenticated => "not_authenticated",
            Self::LockConflict { .. } => "lock_conflict",
            Self::LockHeldByOther { .. } => "lock_held_by_other",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Resolver(_) => "resolver_failed",
        }
    }

    /// Convert into the error envelope sent back to the caller.
    pub fn to_outbound(&self) -> Outbound {
        Outbound::error(self.code(), self.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CoordinatorError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(err.to_string())
    }
}
