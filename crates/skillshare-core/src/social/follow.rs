//! The follow graph between user profiles.
//!
//! Each edge is stored on both ends: the follower's `following` list and the
//! target's `followers` list. Both profiles are written in a single
//! revision-guarded [`UserStore::save_users`] call. A write that loses a race
//! on either profile is rejected as a whole, then re-read and re-applied.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use skillshare_db::models::UserProfile;

use crate::error::{Entity, Error, Result};
use crate::store::UserStore;

/// How many times a profile edit is applied before a run of lost races is
/// reported as [`Error::Conflict`].
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// One row of a follower or following listing, as seen by a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub follower_count: i32,
    pub following_count: i32,
    /// Whether the viewer follows this user.
    pub followed_by_viewer: bool,
}

impl UserSummary {
    fn of(user: &UserProfile, viewer: &UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            follower_count: user.follower_count,
            following_count: user.following_count,
            followed_by_viewer: viewer.is_following(&user.id),
        }
    }
}

pub struct FollowService<U> {
    users: U,
}

impl<U: UserStore> FollowService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    pub fn store(&self) -> &U {
        &self.users
    }

    /// Create a profile with an empty follow graph.
    pub async fn register(&self, id: &str, email: &str, display_name: &str) -> Result<UserProfile> {
        for (field, value) in [("id", id), ("email", email), ("display name", display_name)] {
            if value.trim().is_empty() {
                return Err(Error::ValidationFailed(format!("user {field} must not be blank")));
            }
        }
        let user = self
            .users
            .insert_user(&UserProfile::new(id, email, display_name))
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn profile(&self, id: &str) -> Result<UserProfile> {
        self.load(id).await
    }

    /// Change the display name of `current`.
    pub async fn update_profile(&self, current: &str, display_name: &str) -> Result<UserProfile> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::ValidationFailed("user display name must not be blank".into()));
        }
        let (updated, changed) = self
            .edit(&[current], |users| match users {
                [me] if me.display_name != display_name => {
                    me.display_name = display_name.to_owned();
                    true
                }
                _ => false,
            })
            .await?;
        if changed {
            info!(user_id = current, "profile updated");
        }
        first(updated, current)
    }

    /// Make `current` follow `target`. Following twice is a no-op.
    pub async fn follow(&self, current: &str, target: &str) -> Result<UserProfile> {
        if current == target {
            return Err(Error::InvalidOperation("users cannot follow themselves".into()));
        }
        let (updated, changed) = self
            .edit(&[current, target], |users| match users {
                [me, them] => me.add_following(target) | them.add_follower(current),
                _ => false,
            })
            .await?;
        if changed {
            info!(follower = current, followee = target, "follow added");
        }
        first(updated, current)
    }

    /// Remove the `current` -> `target` edge. Unfollowing someone not
    /// followed is a no-op.
    pub async fn unfollow(&self, current: &str, target: &str) -> Result<UserProfile> {
        let (updated, changed) = self
            .edit(&[current, target], |users| match users {
                [me, them] => me.remove_following(target) | them.remove_follower(current),
                _ => false,
            })
            .await?;
        if changed {
            info!(follower = current, followee = target, "follow removed");
        }
        first(updated, current)
    }

    pub async fn is_following(&self, current: &str, target: &str) -> Result<bool> {
        Ok(self.load(current).await?.is_following(target))
    }

    /// Users following `user_id`, ordered by id.
    pub async fn followers(&self, viewer: &str, user_id: &str) -> Result<Vec<UserSummary>> {
        let user = self.load(user_id).await?;
        self.summaries(viewer, &user.followers).await
    }

    /// Users `user_id` follows, ordered by id.
    pub async fn following(&self, viewer: &str, user_id: &str) -> Result<Vec<UserSummary>> {
        let user = self.load(user_id).await?;
        self.summaries(viewer, &user.following).await
    }

    async fn summaries(&self, viewer: &str, ids: &[String]) -> Result<Vec<UserSummary>> {
        let viewer = self.load(viewer).await?;
        let users = self.users.load_users(ids).await?;
        Ok(users.iter().map(|u| UserSummary::of(u, &viewer)).collect())
    }

    async fn load(&self, id: &str) -> Result<UserProfile> {
        self.users
            .load_user(id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::User, id))
    }

    /// Load the profiles for `ids` (in order), apply `apply`, and save them
    /// together if it reports a change. Returns the current profiles and
    /// whether anything was written.
    ///
    /// On [`Error::Conflict`] the profiles are re-read and `apply` runs
    /// again, up to [`MAX_WRITE_ATTEMPTS`] times in total.
    async fn edit<F>(&self, ids: &[&str], mut apply: F) -> Result<(Vec<UserProfile>, bool)>
    where
        F: FnMut(&mut [UserProfile]) -> bool + Send,
    {
        let mut attempt = 1;
        loop {
            let mut users = Vec::with_capacity(ids.len());
            for id in ids {
                users.push(self.load(id).await?);
            }
            if !apply(users.as_mut_slice()) {
                return Ok((users, false));
            }

            let now = Utc::now();
            for user in &mut users {
                user.updated_at = now;
            }
            match self.users.save_users(&users).await {
                Err(err) if err.is_conflict() && attempt < MAX_WRITE_ATTEMPTS => {
                    debug!(users = ?ids, attempt, "profiles changed concurrently, retrying");
                    attempt += 1;
                }
                result => return result.map(|saved| (saved, true)),
            }
        }
    }
}

fn first(users: Vec<UserProfile>, id: &str) -> Result<UserProfile> {
    users
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(Entity::User, id))
}
