//! In-process stores backed by `HashMap`s behind a `tokio` `RwLock`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use skillshare_db::models::{Note, Plan, UserProfile};

use super::{NoteStore, PlanStore, UserStore};
use crate::error::{Entity, Error, Result};

#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    plans: RwLock<HashMap<Uuid, Plan>>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.plans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plans.read().await.is_empty()
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn load(&self, id: Uuid) -> Result<Option<Plan>> {
        Ok(self.plans.read().await.get(&id).cloned())
    }

    async fn save(&self, plan: &Plan) -> Result<Plan> {
        let mut plans = self.plans.write().await;
        match plans.get(&plan.id) {
            None if plan.revision != 0 => return Err(Error::not_found(Entity::Plan, plan.id)),
            Some(stored) if stored.revision != plan.revision => {
                return Err(Error::conflict(Entity::Plan, plan.id));
            }
            _ => {}
        }

        let mut saved = plan.clone();
        if plans.contains_key(&plan.id) {
            saved.revision += 1;
        }
        plans.insert(saved.id, saved.clone());
        Ok(saved)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.plans.write().await.remove(&id).is_some())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .plans
            .read()
            .await
            .values()
            .filter(|p| !p.is_template && p.is_owned_by(owner_id))
            .cloned()
            .collect();
        plans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(plans)
    }

    async fn list_templates(&self) -> Result<Vec<Plan>> {
        let mut plans: Vec<Plan> = self
            .plans
            .read()
            .await
            .values()
            .filter(|p| p.is_template)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(plans)
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn load_user(&self, id: &str) -> Result<Option<UserProfile>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn load_users(&self, ids: &[String]) -> Result<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut found: Vec<UserProfile> = ids.iter().filter_map(|id| users.get(id).cloned()).collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found.dedup_by(|a, b| a.id == b.id);
        Ok(found)
    }

    async fn insert_user(&self, user: &UserProfile) -> Result<UserProfile> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(Error::InvalidOperation(format!("user {} already exists", user.id)));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(Error::InvalidOperation(format!(
                "email {} is already registered",
                user.email
            )));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn save_users(&self, batch: &[UserProfile]) -> Result<Vec<UserProfile>> {
        let mut users = self.users.write().await;
        for user in batch {
            match users.get(&user.id) {
                None => return Err(Error::not_found(Entity::User, &user.id)),
                Some(stored) if stored.revision != user.revision => {
                    return Err(Error::conflict(Entity::User, &user.id));
                }
                Some(_) => {}
            }
        }

        let mut saved = Vec::with_capacity(batch.len());
        for user in batch {
            let mut next = user.clone();
            next.revision += 1;
            users.insert(next.id.clone(), next.clone());
            saved.push(next);
        }
        Ok(saved)
    }
}

#[derive(Debug, Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn load_note(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.read().await.get(&id).cloned())
    }

    async fn insert_note(&self, note: &Note) -> Result<Note> {
        let mut notes = self.notes.write().await;
        if notes.contains_key(&note.id) {
            return Err(Error::InvalidOperation(format!("note {} already exists", note.id)));
        }
        notes.insert(note.id, note.clone());
        Ok(note.clone())
    }

    async fn update_note(&self, note: &Note) -> Result<Option<Note>> {
        let mut notes = self.notes.write().await;
        let Some(stored) = notes.get_mut(&note.id) else {
            return Ok(None);
        };
        stored.title = note.title.clone();
        stored.content = note.content.clone();
        stored.updated_at = note.updated_at;
        Ok(Some(stored.clone()))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn list_notes(&self, owner_id: &str) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .await
            .values()
            .filter(|n| n.is_owned_by(owner_id))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn plan(n: u128, owner: &str, template: bool) -> Plan {
        let now = Utc::now();
        Plan {
            id: Uuid::from_u128(n),
            title: format!("plan {n}"),
            description: None,
            owner_id: owner.into(),
            is_template: template,
            category: None,
            estimated_hours: 1,
            completed_hours: 0,
            modules: vec![],
            revision: 0,
            created_at: now + Duration::seconds(n as i64),
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn first_save_inserts_at_revision_zero() {
        let store = MemoryPlanStore::new();
        let saved = store.save(&plan(1, "alice", false)).await.unwrap();
        assert_eq!(saved.revision, 0);
        assert_eq!(store.load(saved.id).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn saves_bump_the_revision() {
        let store = MemoryPlanStore::new();
        let first = store.save(&plan(1, "alice", false)).await.unwrap();
        let second = store.save(&first).await.unwrap();
        assert_eq!(second.revision, 1);
        let third = store.save(&second).await.unwrap();
        assert_eq!(third.revision, 2);
    }

    #[tokio::test]
    async fn stale_save_conflicts_and_writes_nothing() {
        let store = MemoryPlanStore::new();
        let original = store.save(&plan(1, "alice", false)).await.unwrap();

        let mut a = original.clone();
        a.title = "from a".into();
        let mut b = original.clone();
        b.title = "from b".into();

        store.save(&a).await.unwrap();
        let err = store.save(&b).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { entity: Entity::Plan, id } if id == original.id.to_string()));
        assert_eq!(store.load(original.id).await.unwrap().unwrap().title, "from a");
    }

    #[tokio::test]
    async fn saving_a_deleted_plan_is_not_found() {
        let store = MemoryPlanStore::new();
        let saved = store.save(&plan(1, "alice", false)).await.unwrap();
        let saved = store.save(&saved).await.unwrap();
        assert!(store.delete(saved.id).await.unwrap());
        assert!(!store.delete(saved.id).await.unwrap());
        assert!(store.save(&saved).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn listings_are_scoped_and_ordered() {
        let store = MemoryPlanStore::new();
        for p in [
            plan(1, "alice", false),
            plan(2, "alice", false),
            plan(3, "bob", false),
            plan(4, "system", true),
        ] {
            store.save(&p).await.unwrap();
        }

        let alice: Vec<Uuid> = store.list_by_owner("alice").await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(alice, vec![Uuid::from_u128(2), Uuid::from_u128(1)]);
        assert!(store.list_by_owner("system").await.unwrap().is_empty());
        assert_eq!(store.list_templates().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_users_are_rejected() {
        let store = MemoryUserStore::new();
        store.insert_user(&UserProfile::new("alice", "a@example.com", "Alice")).await.unwrap();
        let dup_id = store.insert_user(&UserProfile::new("alice", "x@example.com", "A")).await;
        assert!(matches!(dup_id, Err(Error::InvalidOperation(_))));
        let dup_email = store.insert_user(&UserProfile::new("al", "a@example.com", "A")).await;
        assert!(matches!(dup_email, Err(Error::InvalidOperation(_))));
    }

    #[tokio::test]
    async fn save_users_is_all_or_nothing() {
        let store = MemoryUserStore::new();
        let mut alice = store.insert_user(&UserProfile::new("alice", "a@example.com", "Alice")).await.unwrap();
        alice.add_following("ghost");
        let ghost = UserProfile::new("ghost", "g@example.com", "Ghost");

        let err = store.save_users(&[alice, ghost]).await.unwrap_err();
        assert!(err.is_not_found());
        let stored = store.load_user("alice").await.unwrap().unwrap();
        assert!(stored.following.is_empty());
        assert_eq!(stored.revision, 0);
    }

    #[tokio::test]
    async fn stale_profile_save_conflicts_and_writes_nothing() {
        let store = MemoryUserStore::new();
        let bob = store.insert_user(&UserProfile::new("bob", "b@example.com", "Bob")).await.unwrap();
        let carol = store.insert_user(&UserProfile::new("carol", "c@example.com", "Carol")).await.unwrap();

        let mut first = bob.clone();
        first.add_follower("alice");
        let saved = store.save_users(&[first]).await.unwrap();
        assert_eq!(saved[0].revision, 1);

        let mut stale = bob;
        stale.add_follower("carol");
        let mut carol = carol;
        carol.add_following("bob");
        let err = store.save_users(&[carol, stale]).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { entity: Entity::User, ref id } if id == "bob"));

        let bob = store.load_user("bob").await.unwrap().unwrap();
        assert_eq!(bob.followers, vec!["alice".to_string()]);
        assert!(store.load_user("carol").await.unwrap().unwrap().following.is_empty());
    }

    #[tokio::test]
    async fn load_users_skips_unknown_ids() {
        let store = MemoryUserStore::new();
        for id in ["dave", "bob"] {
            store.insert_user(&UserProfile::new(id, format!("{id}@example.com"), id)).await.unwrap();
        }
        let ids = ["dave", "ghost", "bob"].map(String::from);
        let found: Vec<String> = store.load_users(&ids).await.unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(found, vec!["bob".to_string(), "dave".to_string()]);
    }

    fn note(n: u128, owner: &str, age_secs: i64) -> Note {
        let at = Utc::now() - Duration::seconds(age_secs);
        Note {
            id: Uuid::from_u128(n),
            owner_id: owner.into(),
            title: format!("note {n}"),
            content: String::new(),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn notes_list_newest_first_per_owner() {
        let store = MemoryNoteStore::new();
        for n in [note(1, "alice", 30), note(2, "alice", 10), note(3, "bob", 0)] {
            store.insert_note(&n).await.unwrap();
        }
        let alice: Vec<Uuid> = store.list_notes("alice").await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(alice, vec![Uuid::from_u128(2), Uuid::from_u128(1)]);

        let mut gone = note(9, "alice", 0);
        gone.title = "never stored".into();
        assert!(store.update_note(&gone).await.unwrap().is_none());
        assert!(store.insert_note(&note(1, "alice", 0)).await.is_err());
        assert_eq!(store.len().await, 3);
    }
}
