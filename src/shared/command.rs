//! Inbound Command Envelope
//!
//! Every text frame a client sends decodes to exactly one [`Command`].
//! The envelope is tagged JSON: `{"type": "acquireLock", "noteId": 42}`.
//!
//! Earlier iterations of the product used comma-delimited positional
//! strings (`"editNote,42"`) alongside the structured form; this crate
//! standardizes on the structured encoding.

use serde::{Deserialize, Serialize};

/// Identifier of a note, matching the note store's primary key.
pub type NoteId = i64;

/// Stable key identifying an authenticated user across connections.
///
/// The value is the verified email address. It is opaque to the
/// coordinator: never parsed, only compared and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(pub String);

impl UserIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A structured command decoded from one inbound frame.
///
/// All commands except `authenticate` require the connection to have
/// authenticated first. The synthetic disconnect event is not part of the
/// wire protocol; the gateway raises it when the transport closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Bind this connection to the identity proven by `token`.
    Authenticate { token: String },
    /// Attempt to take the edit lock on a note.
    #[serde(rename_all = "camelCase")]
    AcquireLock { note_id: NoteId },
    /// Give the edit lock on a note back.
    #[serde(rename_all = "camelCase")]
    ReleaseLock { note_id: NoteId },
    /// Ask for the current lock state of a note.
    #[serde(rename_all = "camelCase")]
    LockStatus { note_id: NoteId },
    /// Tell an online user they were just added as a collaborator.
    #[serde(rename_all = "camelCase")]
    CollaboratorAdded { note_id: NoteId, email: String },
}

impl Command {
    /// Decode a raw text frame into a command.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
