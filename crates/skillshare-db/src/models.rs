use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Owner id of the built-in template catalogue.
pub const SYSTEM_OWNER: &str = "system";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of reference material attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Article,
    Video,
    Exercise,
    Book,
    Course,
    Link,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Article => "article",
            Self::Video => "video",
            Self::Exercise => "exercise",
            Self::Book => "book",
            Self::Course => "course",
            Self::Link => "link",
        };
        f.write_str(s)
    }
}

impl FromStr for ResourceType {
    type Err = ResourceTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(Self::Article),
            "video" => Ok(Self::Video),
            "exercise" => Ok(Self::Exercise),
            "book" => Ok(Self::Book),
            "course" => Ok(Self::Course),
            "link" => Ok(Self::Link),
            other => Err(ResourceTypeParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`ResourceType`] string.
#[derive(Debug, Clone)]
pub struct ResourceTypeParseError(pub String);

impl fmt::Display for ResourceTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid resource type: {:?}", self.0)
    }
}

impl std::error::Error for ResourceTypeParseError {}

// ---------------------------------------------------------------------------

/// Progress status of a plan, derived from its task completion state.
///
/// Never stored; see [`Plan::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(PlanStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan status: {:?}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ---------------------------------------------------------------------------
// Plan tree
// ---------------------------------------------------------------------------

/// Reference material attached to a task. Leaf of the plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A unit of work within a module. The only node with completion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_minutes: i32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Task {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A grouping of tasks within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub estimated_hours: i32,
    /// Derived from task completion; maintained by the aggregator.
    #[serde(default)]
    pub completed_hours: i32,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Module {
    /// Look up a task of this module by id.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

/// A learning plan -- the persisted aggregate root.
///
/// The module/task/resource subtree is stored as a single JSON document so a
/// plan is always read and written as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub is_template: bool,
    pub category: Option<String>,
    pub estimated_hours: i32,
    /// Derived from module rollups; maintained by the aggregator.
    pub completed_hours: i32,
    #[sqlx(json)]
    pub modules: Vec<Module>,
    /// Optimistic-concurrency counter, bumped by every successful save.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Look up a module of this plan by id.
    pub fn module(&self, id: Uuid) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn module_mut(&mut self, id: Uuid) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.id == id)
    }

    /// Iterate over every task in tree order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.modules.iter().flat_map(|m| m.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.modules.iter().map(|m| m.tasks.len()).sum()
    }

    pub fn completed_task_count(&self) -> usize {
        self.tasks().filter(|t| t.is_complete()).count()
    }

    /// Derive the progress status from task completion.
    ///
    /// A plan with no tasks is never considered completed.
    pub fn status(&self) -> PlanStatus {
        let total = self.task_count();
        let done = self.completed_task_count();
        if done == 0 {
            PlanStatus::NotStarted
        } else if done == total {
            PlanStatus::Completed
        } else {
            PlanStatus::InProgress
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user's public profile and follow graph.
///
/// `following_count` and `follower_count` are denormalized from the id
/// lists and are recomputed on every mutation. `revision` guards writes the
/// same way [`Plan::revision`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub following: Vec<String>,
    pub followers: Vec<String>,
    pub following_count: i32,
    pub follower_count: i32,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
            following: Vec::new(),
            followers: Vec::new(),
            following_count: 0,
            follower_count: 0,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|id| id == user_id)
    }

    pub fn is_followed_by(&self, user_id: &str) -> bool {
        self.followers.iter().any(|id| id == user_id)
    }

    /// Returns `true` if the id was not already present.
    pub fn add_following(&mut self, user_id: &str) -> bool {
        let added = insert_sorted(&mut self.following, user_id);
        self.following_count = count(&self.following);
        added
    }

    pub fn remove_following(&mut self, user_id: &str) -> bool {
        let removed = remove_id(&mut self.following, user_id);
        self.following_count = count(&self.following);
        removed
    }

    pub fn add_follower(&mut self, user_id: &str) -> bool {
        let added = insert_sorted(&mut self.followers, user_id);
        self.follower_count = count(&self.followers);
        added
    }

    pub fn remove_follower(&mut self, user_id: &str) -> bool {
        let removed = remove_id(&mut self.followers, user_id);
        self.follower_count = count(&self.followers);
        removed
    }
}

fn insert_sorted(ids: &mut Vec<String>, user_id: &str) -> bool {
    match ids.binary_search_by(|id| id.as_str().cmp(user_id)) {
        Ok(_) => false,
        Err(pos) => {
            ids.insert(pos, user_id.to_owned());
            true
        }
    }
}

fn remove_id(ids: &mut Vec<String>, user_id: &str) -> bool {
    let before = ids.len();
    ids.retain(|id| id != user_id);
    ids.len() != before
}

fn count(ids: &[String]) -> i32 {
    i32::try_from(ids.len()).unwrap_or(i32::MAX)
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// A free-form note kept by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
