//! Collaborator Resolver
//!
//! Thin read-through used by the coordinator to decide who a broadcast
//! goes to. A failure here never undoes the triggering lock transition;
//! the coordinator skips the broadcast and tells the caller delivery may
//! not have happened.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::error::CoordinatorError;
use crate::backend::notes::store::NoteStore;
use crate::shared::command::{NoteId, UserIdentity};

/// Resolves a note to the set of identities entitled to notifications.
#[derive(Clone)]
pub struct CollaboratorResolver {
    store: Arc<dyn NoteStore>,
}

impl CollaboratorResolver {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    /// The collaborator set for a note, re-read from the store each call.
    pub async fn resolve(&self, note_id: NoteId) -> Result<HashSet<UserIdentity>, CoordinatorError> {
        let collaborators = self.store.collaborators(note_id).await?;
        Ok(collaborators.into_iter().collect())
    }

    /// The note's title for notification text.
    pub async fn note_title(&self, note_id: NoteId) -> Result<Option<String>, CoordinatorError> {
        Ok(self.store.note_title(note_id).await?)
    }
}
