//! Database query functions for the `user_profiles` table.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::UserProfile;

/// Outcome of [`save_profiles`].
#[derive(Debug)]
pub enum ProfileWrite {
    /// Every profile was written; each carries its new revision.
    Saved(Vec<UserProfile>),
    /// No profile with this id exists. Nothing was written.
    Missing(String),
    /// The stored profile has moved past the given revision. Nothing was
    /// written.
    Stale(String),
}

/// Insert a new profile at revision 0. Returns `None` if the id or email is
/// taken.
pub async fn insert_user(pool: &PgPool, user: &UserProfile) -> Result<Option<UserProfile>> {
    let inserted = sqlx::query_as::<_, UserProfile>(
        "INSERT INTO user_profiles \
             (id, email, display_name, following, followers, \
              following_count, follower_count, revision, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9) \
         ON CONFLICT DO NOTHING \
         RETURNING *",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.display_name)
    .bind(&user.following)
    .bind(&user.followers)
    .bind(user.following_count)
    .bind(user.follower_count)
    .bind(user.created_at)
    .bind(user.updated_at)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to insert user {}", user.id))?;

    Ok(inserted)
}

/// Fetch a profile by id.
pub async fn get_user(pool: &PgPool, id: &str) -> Result<Option<UserProfile>> {
    let user = sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch the profiles for `ids`, ordered by id. Unknown ids are skipped.
pub async fn list_users(pool: &PgPool, ids: &[String]) -> Result<Vec<UserProfile>> {
    let users = sqlx::query_as::<_, UserProfile>(
        "SELECT * FROM user_profiles WHERE id = ANY($1) ORDER BY id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
    .context("failed to list users")?;

    Ok(users)
}

/// Write the display name and follow state of several profiles in one
/// transaction, each guarded by its revision.
///
/// Either every profile is updated (and its revision bumped) or none is. A
/// missing or stale profile rolls the whole batch back and is reported by
/// id.
pub async fn save_profiles(pool: &PgPool, users: &[UserProfile]) -> Result<ProfileWrite> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut saved = Vec::with_capacity(users.len());

    for user in users {
        let updated = sqlx::query_as::<_, UserProfile>(
            "UPDATE user_profiles \
             SET display_name = $1, following = $2, followers = $3, \
                 following_count = $4, follower_count = $5, updated_at = $6, \
                 revision = revision + 1 \
             WHERE id = $7 AND revision = $8 \
             RETURNING *",
        )
        .bind(&user.display_name)
        .bind(&user.following)
        .bind(&user.followers)
        .bind(user.following_count)
        .bind(user.follower_count)
        .bind(user.updated_at)
        .bind(&user.id)
        .bind(user.revision)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("failed to update profile of user {}", user.id))?;

        match updated {
            Some(row) => saved.push(row),
            None => {
                let exists: Option<i64> =
                    sqlx::query_scalar("SELECT revision FROM user_profiles WHERE id = $1")
                        .bind(&user.id)
                        .fetch_optional(&mut *tx)
                        .await
                        .with_context(|| format!("failed to re-read user {}", user.id))?;

                // Transaction rolls back on drop.
                return Ok(match exists {
                    Some(_) => ProfileWrite::Stale(user.id.clone()),
                    None => ProfileWrite::Missing(user.id.clone()),
                });
            }
        }
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(ProfileWrite::Saved(saved))
}
