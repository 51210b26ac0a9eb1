//! Note Lock Table
//!
//! One advisory edit lock per note. Entries are created lazily on first
//! acquisition and never deleted; a missing entry is equivalent to
//! [`LockState::Free`].
//!
//! Serialization is per note: the outer map lock is held only long enough
//! to find or create an entry, and every state transition happens inside
//! that entry's own mutex without yielding. Two `try_acquire` calls for
//! the same free note therefore cannot both observe `Free`, and unrelated
//! notes never contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::shared::command::{NoteId, UserIdentity};

/// Authoritative lock state for one note.
///
/// `status` is a denormalized display projection of the holder; the
/// `Free`/`Held` tag and `holder` field are the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Free,
    Held {
        holder: UserIdentity,
        holder_name: String,
        status: String,
    },
}

impl LockState {
    pub fn is_free(&self) -> bool {
        matches!(self, LockState::Free)
    }
}

/// Result of a release attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The caller held the lock and it is now free.
    Released,
    /// The note was already free; releasing is idempotent.
    NotHeld,
    /// Someone else holds the lock; nothing changed.
    HeldByOther { holder: UserIdentity, status: String },
}

/// Note → lock state, with per-note serialization of transitions.
#[derive(Clone, Default)]
pub struct NoteLockTable {
    notes: Arc<RwLock<HashMap<NoteId, Arc<Mutex<LockState>>>>>,
}

impl NoteLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or lazily create the entry for a note.
    async fn entry(&self, note_id: NoteId) -> Arc<Mutex<LockState>> {
        {
            let notes = self.notes.read().await;
            if let Some(entry) = notes.get(&note_id) {
                return Arc::clone(entry);
            }
        }
        let mut notes = self.notes.write().await;
        Arc::clone(
            notes
                .entry(note_id)
                .or_insert_with(|| Arc::new(Mutex::new(LockState::Free))),
        )
    }

    /// Atomic compare-and-set from `Free` to `Held`.
    ///
    /// On success returns the new status string; on conflict returns the
    /// current holder and their status, state unchanged.
    pub async fn try_acquire(
        &self,
        note_id: NoteId,
        identity: &UserIdentity,
        display_name: &str,
    ) -> Result<String, (UserIdentity, String)> {
        let entry = self.entry(note_id).await;
        let mut state = entry.lock().unwrap();
        match &*state {
            LockState::Free => {
                let status = format!("{} is editing this note", display_name);
                *state = LockState::Held {
                    holder: identity.clone(),
                    holder_name: display_name.to_string(),
                    status: status.clone(),
                };
                Ok(status)
            }
            LockState::Held { holder, status, .. } => Err((holder.clone(), status.clone())),
        }
    }

    /// Atomic compare-and-set from `Held(identity, _)` to `Free`.
    pub async fn release(&self, note_id: NoteId, identity: &UserIdentity) -> ReleaseOutcome {
        let entry = self.entry(note_id).await;
        let mut state = entry.lock().unwrap();
        match &*state {
            LockState::Free => ReleaseOutcome::NotHeld,
            LockState::Held { holder, status, .. } if holder != identity => {
                ReleaseOutcome::HeldByOther {
                    holder: holder.clone(),
                    status: status.clone(),
                }
            }
            LockState::Held { .. } => {
                *state = LockState::Free;
                ReleaseOutcome::Released
            }
        }
    }

    /// Current state of a note's lock.
    pub async fn get(&self, note_id: NoteId) -> LockState {
        let notes = self.notes.read().await;
        match notes.get(&note_id) {
            Some(entry) => entry.lock().unwrap().clone(),
            None => LockState::Free,
        }
    }

    /// Release every lock held by `identity`, returning the affected
    /// notes. Used by the release-on-disconnect policy.
    pub async fn release_all_held_by(&self, identity: &UserIdentity) -> Vec<NoteId> {
        let notes = self.notes.read().await;
        let mut released = Vec::new();
        for (note_id, entry) in notes.iter() {
            let mut state = entry.lock().unwrap();
            if matches!(&*state, LockState::Held { holder, .. } if holder == identity) {
                *state = LockState::Free;
                released.push(*note_id);
            }
        }
        released
    }
}
