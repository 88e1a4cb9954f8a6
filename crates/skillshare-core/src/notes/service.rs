//! Note operations. Every note belongs to exactly one user and only that
//! user may read, change or delete it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use skillshare_db::models::Note;

use crate::error::{Entity, Error, Result};
use crate::ids::{IdGenerator, RandomIds};
use crate::store::NoteStore;

/// Title and body of a note to create or replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::ValidationFailed("note title must not be blank".into()));
        }
        Ok(())
    }
}

pub struct NoteService<N> {
    store: N,
    ids: Box<dyn IdGenerator>,
}

impl<N: NoteStore> NoteService<N> {
    pub fn new(store: N) -> Self {
        Self::with_id_generator(store, RandomIds)
    }

    pub fn with_id_generator(store: N, ids: impl IdGenerator + 'static) -> Self {
        Self {
            store,
            ids: Box::new(ids),
        }
    }

    pub fn store(&self) -> &N {
        &self.store
    }

    pub async fn create(&self, requester: &str, request: &NoteRequest) -> Result<Note> {
        request.validate()?;
        let now = Utc::now();
        let note = Note {
            id: self.ids.new_id(),
            owner_id: requester.to_owned(),
            title: request.title.trim().to_owned(),
            content: request.content.clone(),
            created_at: now,
            updated_at: now,
        };
        let saved = self.store.insert_note(&note).await?;
        info!(note_id = %saved.id, owner = requester, "note created");
        Ok(saved)
    }

    pub async fn get(&self, requester: &str, note_id: Uuid) -> Result<Note> {
        self.load_owned(requester, note_id, "read").await
    }

    /// The requester's notes, most recently updated first.
    pub async fn list(&self, requester: &str) -> Result<Vec<Note>> {
        self.store.list_notes(requester).await
    }

    /// The requester's notes whose title or content contains `query`,
    /// ignoring case. A blank query matches every note.
    pub async fn search(&self, requester: &str, query: &str) -> Result<Vec<Note>> {
        let needle = query.trim().to_lowercase();
        let mut notes = self.list(requester).await?;
        notes.retain(|n| {
            n.title.to_lowercase().contains(&needle) || n.content.to_lowercase().contains(&needle)
        });
        Ok(notes)
    }

    /// Replace the title and content of a note.
    pub async fn update(&self, requester: &str, note_id: Uuid, request: &NoteRequest) -> Result<Note> {
        request.validate()?;
        let mut note = self.load_owned(requester, note_id, "update").await?;
        note.title = request.title.trim().to_owned();
        note.content = request.content.clone();
        note.updated_at = Utc::now();

        let saved = self
            .store
            .update_note(&note)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Note, note_id))?;
        info!(note_id = %note_id, "note updated");
        Ok(saved)
    }

    pub async fn delete(&self, requester: &str, note_id: Uuid) -> Result<()> {
        self.load_owned(requester, note_id, "delete").await?;
        if !self.store.delete_note(note_id).await? {
            return Err(Error::not_found(Entity::Note, note_id));
        }
        info!(note_id = %note_id, "note deleted");
        Ok(())
    }

    async fn load_owned(&self, requester: &str, note_id: Uuid, action: &'static str) -> Result<Note> {
        let note = self
            .store
            .load_note(note_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Note, note_id))?;
        if !note.is_owned_by(requester) {
            return Err(Error::not_authorized(requester, action, Entity::Note, note_id));
        }
        Ok(note)
    }
}
