//! PostgreSQL-backed stores over the `skillshare-db` query layer.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use skillshare_db::models::{Note, Plan, UserProfile};
use skillshare_db::queries::users::ProfileWrite;
use skillshare_db::queries::{notes, plans, users};

use super::{NoteStore, PlanStore, UserStore};
use crate::error::{Entity, Error, Result};

#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn load(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(plans::get_plan(&self.pool, id).await?)
    }

    async fn save(&self, plan: &Plan) -> Result<Plan> {
        if let Some(updated) = plans::update_plan(&self.pool, plan).await? {
            debug!(plan_id = %plan.id, revision = updated.revision, "plan updated");
            return Ok(updated);
        }

        // No row matched (id, revision): either a new plan, a stale copy, or
        // a plan that was deleted underneath us.
        if plans::get_plan(&self.pool, plan.id).await?.is_some() {
            return Err(Error::conflict(Entity::Plan, plan.id));
        }
        if plan.revision != 0 {
            return Err(Error::not_found(Entity::Plan, plan.id));
        }
        match plans::insert_plan(&self.pool, plan).await? {
            Some(inserted) => {
                debug!(plan_id = %plan.id, "plan inserted");
                Ok(inserted)
            }
            // Lost an insert race on the same id.
            None => Err(Error::conflict(Entity::Plan, plan.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(plans::delete_plan(&self.pool, id).await?)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Plan>> {
        Ok(plans::list_plans_for_owner(&self.pool, owner_id).await?)
    }

    async fn list_templates(&self) -> Result<Vec<Plan>> {
        Ok(plans::list_templates(&self.pool).await?)
    }
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn load_user(&self, id: &str) -> Result<Option<UserProfile>> {
        Ok(users::get_user(&self.pool, id).await?)
    }

    async fn load_users(&self, ids: &[String]) -> Result<Vec<UserProfile>> {
        Ok(users::list_users(&self.pool, ids).await?)
    }

    async fn insert_user(&self, user: &UserProfile) -> Result<UserProfile> {
        users::insert_user(&self.pool, user).await?.ok_or_else(|| {
            Error::InvalidOperation(format!(
                "user {} or email {} is already registered",
                user.id, user.email
            ))
        })
    }

    async fn save_users(&self, batch: &[UserProfile]) -> Result<Vec<UserProfile>> {
        let outcome = users::save_profiles(&self.pool, batch)
            .await
            .with_context(|| format!("failed to save {} profiles", batch.len()))?;
        match outcome {
            ProfileWrite::Saved(saved) => Ok(saved),
            ProfileWrite::Missing(id) => Err(Error::not_found(Entity::User, id)),
            ProfileWrite::Stale(id) => {
                debug!(user_id = %id, "profile write lost a race");
                Err(Error::conflict(Entity::User, id))
            }
        }
    }
}

#[derive(Debug, Clone)]
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
    async fn load_note(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(notes::get_note(&self.pool, id).await?)
    }

    async fn insert_note(&self, note: &Note) -> Result<Note> {
        Ok(notes::insert_note(&self.pool, note).await?)
    }

    async fn update_note(&self, note: &Note) -> Result<Option<Note>> {
        Ok(notes::update_note(&self.pool, note).await?)
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool> {
        Ok(notes::delete_note(&self.pool, id).await?)
    }

    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        Ok(notes::list_notes_for_owner(&self.pool, owner_id).await?)
    }
}
