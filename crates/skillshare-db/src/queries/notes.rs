//! Database query functions for the `notes` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Note;

pub async fn insert_note(pool: &PgPool, note: &Note) -> Result<Note> {
    let inserted = sqlx::query_as::<_, Note>(
        "INSERT INTO notes (id, owner_id, title, content, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(note.id)
    .bind(&note.owner_id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(note.created_at)
    .bind(note.updated_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert note {}", note.id))?;

    Ok(inserted)
}

pub async fn get_note(pool: &PgPool, id: Uuid) -> Result<Option<Note>> {
    let note = sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch note")?;

    Ok(note)
}

/// Replace title, content and `updated_at`. `None` if the note is gone.
pub async fn update_note(pool: &PgPool, note: &Note) -> Result<Option<Note>> {
    let updated = sqlx::query_as::<_, Note>(
        "UPDATE notes SET title = $1, content = $2, updated_at = $3 \
         WHERE id = $4 \
         RETURNING *",
    )
    .bind(&note.title)
    .bind(&note.content)
    .bind(note.updated_at)
    .bind(note.id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to update note {}", note.id))?;

    Ok(updated)
}

/// Returns `false` if there was no such note.
pub async fn delete_note(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM notes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete note {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Notes owned by `owner_id`, most recently updated first.
pub async fn list_notes_for_owner(pool: &PgPool, owner_id: &str) -> Result<Vec<Note>> {
    let notes = sqlx::query_as::<_, Note>(
        "SELECT * FROM notes WHERE owner_id = $1 ORDER BY updated_at DESC, id",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list notes")?;

    Ok(notes)
}
