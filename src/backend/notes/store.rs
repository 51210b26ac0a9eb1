//! Read-Only Note Store Client
//!
//! [`NoteStore`] is the boundary to the product database. The Postgres
//! implementation reads the same `"Note"` / `"Collaborator"` tables the
//! CRUD backend writes; the in-memory implementation backs tests and
//! database-less operation.
//!
//! Collaborator sets are re-read on every query. Staleness up to one
//! round-trip is acceptable; no caching happens here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::backend::error::NoteStoreError;
use crate::shared::command::{NoteId, UserIdentity};

/// Read-only access to note metadata owned by the product backend.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// The identities entitled to notifications about a note.
    async fn collaborators(&self, note_id: NoteId) -> Result<Vec<UserIdentity>, NoteStoreError>;

    /// The note's title, used in notification text. `None` if the note
    /// does not exist.
    async fn note_title(&self, note_id: NoteId) -> Result<Option<String>, NoteStoreError>;
}

/// Postgres-backed store reading the product schema.
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn collaborators(&self, note_id: NoteId) -> Result<Vec<UserIdentity>, NoteStoreError> {
        let emails: Vec<String> =
            sqlx::query_scalar(r#"SELECT "userEmail" FROM "Collaborator" WHERE "noteId" = $1"#)
                .bind(note_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(emails.into_iter().map(UserIdentity).collect())
    }

    async fn note_title(&self, note_id: NoteId) -> Result<Option<String>, NoteStoreError> {
        let title: Option<String> =
            sqlx::query_scalar(r#"SELECT "title" FROM "Note" WHERE "id" = $1"#)
                .bind(note_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(title)
    }
}

#[derive(Debug, Clone)]
struct NoteRecord {
    title: String,
    collaborators: Vec<UserIdentity>,
}

/// In-memory store for tests and for running without `DATABASE_URL`.
#[derive(Clone, Default)]
pub struct InMemoryNoteStore {
    notes: Arc<RwLock<HashMap<NoteId, NoteRecord>>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a note with its title.
    pub async fn add_note(&self, note_id: NoteId, title: impl Into<String>) {
        let title = title.into();
        let mut notes = self.notes.write().await;
        notes
            .entry(note_id)
            .and_modify(|record| record.title = title.clone())
            .or_insert(NoteRecord {
                title,
                collaborators: Vec::new(),
            });
    }

    /// Add a collaborator to a note, creating the note if needed.
    pub async fn add_collaborator(&self, note_id: NoteId, email: impl Into<String>) {
        let mut notes = self.notes.write().await;
        let record = notes.entry(note_id).or_insert_with(|| NoteRecord {
            title: format!("Note {}", note_id),
            collaborators: Vec::new(),
        });
        let identity = UserIdentity::new(email);
        if !record.collaborators.contains(&identity) {
            record.collaborators.push(identity);
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn collaborators(&self, note_id: NoteId) -> Result<Vec<UserIdentity>, NoteStoreError> {
        let notes = self.notes.read().await;
        Ok(notes
            .get(&note_id)
            .map(|record| record.collaborators.clone())
            .unwrap_or_default())
    }

    async fn note_title(&self, note_id: NoteId) -> Result<Option<String>, NoteStoreError> {
        let notes = self.notes.read().await;
        Ok(notes.get(&note_id).map(|record| record.title.clone()))
    }
}
