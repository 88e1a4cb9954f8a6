//! Persistence seams for plans, user profiles and notes.
//!
//! All traits are object-safe and implemented by an in-memory store (tests,
//! embedding) and a PostgreSQL store. Every save is all-or-nothing.

use async_trait::async_trait;
use uuid::Uuid;

use skillshare_db::models::{Note, Plan, UserProfile};

use crate::error::Result;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryNoteStore, MemoryPlanStore, MemoryUserStore};
pub use postgres::{PgNoteStore, PgPlanStore, PgUserStore};

/// Whole-record storage for plans.
///
/// `save` follows optimistic concurrency on [`Plan::revision`]:
/// - revision 0 and no stored record: insert.
/// - stored record with the same revision: replace.
/// - any other combination: [`crate::Error::Conflict`] (or `NotFound` when
///   a non-zero revision names a record that no longer exists).
///
/// On success the returned plan carries the new revision.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Plan>>;

    async fn save(&self, plan: &Plan) -> Result<Plan>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Non-template plans owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Plan>>;

    /// All templates, ordered by title.
    async fn list_templates(&self) -> Result<Vec<Plan>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn load_user(&self, id: &str) -> Result<Option<UserProfile>>;

    /// Profiles for `ids`, ordered by id. Unknown ids are skipped.
    async fn load_users(&self, ids: &[String]) -> Result<Vec<UserProfile>>;

    /// Fails with `InvalidOperation` if the id or email is already taken.
    async fn insert_user(&self, user: &UserProfile) -> Result<UserProfile>;

    /// Write several existing profiles in one atomic step.
    ///
    /// Each profile is guarded by its [`UserProfile::revision`]. If any
    /// profile is missing (`NotFound`) or stale (`Conflict`) nothing is
    /// written. On success the profiles come back in input order with their
    /// new revisions.
    async fn save_users(&self, users: &[UserProfile]) -> Result<Vec<UserProfile>>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn load_note(&self, id: Uuid) -> Result<Option<Note>>;

    async fn insert_note(&self, note: &Note) -> Result<Note>;

    /// Replace title, content and `updated_at`. `None` if the note is gone.
    async fn update_note(&self, note: &Note) -> Result<Option<Note>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_note(&self, id: Uuid) -> Result<bool>;

    /// Notes owned by `owner_id`, most recently updated first.
    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>>;
}
