//! Database query functions for the `learning_plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::Plan;

/// Insert a new plan row with revision 0.
///
/// Returns `None` if a row with the same id already exists; the caller
/// decides whether that is a conflict.
pub async fn insert_plan(pool: &PgPool, plan: &Plan) -> Result<Option<Plan>> {
    let inserted = sqlx::query_as::<_, Plan>(
        "INSERT INTO learning_plans \
             (id, title, description, owner_id, is_template, category, \
              estimated_hours, completed_hours, modules, revision, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0, $10, $11) \
         ON CONFLICT (id) DO NOTHING \
         RETURNING *",
    )
    .bind(plan.id)
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(&plan.owner_id)
    .bind(plan.is_template)
    .bind(&plan.category)
    .bind(plan.estimated_hours)
    .bind(plan.completed_hours)
    .bind(Json(&plan.modules))
    .bind(plan.created_at)
    .bind(plan.updated_at)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to insert plan {}", plan.id))?;

    Ok(inserted)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM learning_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Replace a whole plan record, guarded by its revision.
///
/// The row is only written when the stored revision equals
/// `plan.revision`; on success the revision is incremented and the new row
/// returned. `None` means the plan is missing or was written concurrently.
pub async fn update_plan(pool: &PgPool, plan: &Plan) -> Result<Option<Plan>> {
    let updated = sqlx::query_as::<_, Plan>(
        "UPDATE learning_plans \
         SET title = $1, description = $2, owner_id = $3, is_template = $4, \
             category = $5, estimated_hours = $6, completed_hours = $7, \
             modules = $8, updated_at = $9, revision = revision + 1 \
         WHERE id = $10 AND revision = $11 \
         RETURNING *",
    )
    .bind(&plan.title)
    .bind(&plan.description)
    .bind(&plan.owner_id)
    .bind(plan.is_template)
    .bind(&plan.category)
    .bind(plan.estimated_hours)
    .bind(plan.completed_hours)
    .bind(Json(&plan.modules))
    .bind(plan.updated_at)
    .bind(plan.id)
    .bind(plan.revision)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to update plan {}", plan.id))?;

    Ok(updated)
}

/// Delete a plan and, with it, its whole module/task/resource tree.
///
/// Returns `true` if a row was removed.
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM learning_plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    Ok(result.rows_affected() > 0)
}

/// List the non-template plans owned by a user, newest first.
pub async fn list_plans_for_owner(pool: &PgPool, owner_id: &str) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM learning_plans \
         WHERE owner_id = $1 AND NOT is_template \
         ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans for owner")?;

    Ok(plans)
}

/// List every template plan, ordered by title.
pub async fn list_templates(pool: &PgPool) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM learning_plans WHERE is_template ORDER BY title ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list templates")?;

    Ok(plans)
}
