//! Outbound Notification Envelope
//!
//! Every message the coordinator pushes to a connection is one [`Outbound`]
//! value, encoded as tagged JSON: `{"kind": "noteLocked", ...}`. Each
//! envelope carries at minimum a human-readable `message`; lock status
//! replies additionally keep the literal `status:` sentinel prefix that
//! existing clients parse.
//!
//! The `message` strings are display projections only. Clients must never
//! parse an identity back out of them for authorization decisions; the
//! structured fields carry the authoritative data.

use serde::{Deserialize, Serialize};

use crate::shared::command::NoteId;

/// One message pushed to a single connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outbound {
    /// Reply to a successful `authenticate`.
    Authenticated { message: String, email: String },
    /// Reply to the caller whose `acquireLock` succeeded.
    #[serde(rename_all = "camelCase")]
    LockAcquired { message: String, note_id: NoteId },
    /// Reply to the caller whose `releaseLock` succeeded (or was a no-op).
    #[serde(rename_all = "camelCase")]
    LockReleased { message: String, note_id: NoteId },
    /// Reply to `lockStatus`; `message` starts with `status:`.
    #[serde(rename_all = "camelCase")]
    LockStatus { message: String, note_id: NoteId },
    /// Broadcast to collaborators when someone takes the lock.
    #[serde(rename_all = "camelCase")]
    NoteLocked {
        message: String,
        note_id: NoteId,
        holder: String,
    },
    /// Broadcast to collaborators when the lock goes back to free.
    #[serde(rename_all = "camelCase")]
    NoteUnlocked { message: String, note_id: NoteId },
    /// Direct push to a newly added collaborator, or the caller's receipt.
    #[serde(rename_all = "camelCase")]
    CollaboratorAdded { message: String, note_id: NoteId },
    /// Error reply; delivered to the originating connection only.
    Error { message: String, code: String },
}

impl Outbound {
    /// Reply confirming authentication.
    pub fn authenticated(email: impl Into<String>) -> Self {
        let email = email.into();
        Self::Authenticated {
            message: format!("Authenticated as {}", email),
            email,
        }
    }

    /// Acquisition acknowledgment to the caller.
    pub fn lock_acquired(note_id: NoteId) -> Self {
        Self::LockAcquired {
            message: format!("You are now editing note {}", note_id),
            note_id,
        }
    }

    /// Acquisition acknowledgment when the collaborator lookup failed and
    /// the broadcast was skipped.
    pub fn lock_acquired_unnotified(note_id: NoteId) -> Self {
        Self::LockAcquired {
            message: format!(
                "You are now editing note {}; collaborators may not have been notified",
                note_id
            ),
            note_id,
        }
    }

    /// Release acknowledgment to the caller.
    pub fn lock_released(note_id: NoteId) -> Self {
        Self::LockReleased {
            message: format!("You are no longer editing note {}", note_id),
            note_id,
        }
    }

    /// Release acknowledgment when the collaborator lookup failed and
    /// the broadcast was skipped.
    pub fn lock_released_unnotified(note_id: NoteId) -> Self {
        Self::LockReleased {
            message: format!(
                "You are no longer editing note {}; collaborators may not have been notified",
                note_id
            ),
            note_id,
        }
    }

    /// Status reply for a free note.
    pub fn status_free(note_id: NoteId) -> Self {
        Self::LockStatus {
            message: "status:free".to_string(),
            note_id,
        }
    }

    /// Status reply for a held note; `status` is the holder's display
    /// string, e.g. `"Ada is editing this note"`.
    pub fn status_held(note_id: NoteId, status: &str) -> Self {
        Self::LockStatus {
            message: format!("status:{}", status),
            note_id,
        }
    }

    /// Broadcast sent to a note's collaborators on acquisition.
    pub fn note_locked(note_id: NoteId, status: impl Into<String>, holder: impl Into<String>) -> Self {
        Self::NoteLocked {
            message: format!("Note {}: {}", note_id, status.into()),
            note_id,
            holder: holder.into(),
        }
    }

    /// Broadcast sent to a note's collaborators on release.
    pub fn note_unlocked(note_id: NoteId) -> Self {
        Self::NoteUnlocked {
            message: format!("Note {} is no longer being edited", note_id),
            note_id,
        }
    }

    /// Direct push telling a user they became a collaborator.
    pub fn collaborator_added(note_id: NoteId, message: impl Into<String>) -> Self {
        Self::CollaboratorAdded {
            message: message.into(),
            note_id,
        }
    }

    /// Error envelope.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Encode for the wire. Falls back to a static error envelope if
    /// serialization itself fails, which it cannot for these types.
    pub fn encode(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"kind":"error","message":"encoding failed","code":"internal"}"#.to_string())
    }
}
