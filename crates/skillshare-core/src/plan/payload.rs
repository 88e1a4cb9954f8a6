//! Request payloads for creating and editing plans, and their TOML file
//! format.
//!
//! A plan file looks like:
//!
//! ```toml
//! [plan]
//! title = "Rust fundamentals"
//! category = "Programming"
//! estimated_hours = 10
//!
//! [[modules]]
//! title = "Ownership"
//! estimated_hours = 4
//!
//! [[modules.tasks]]
//! title = "Borrowing rules"
//! estimated_minutes = 90
//!
//! [[modules.tasks.resources]]
//! title = "The Book, chapter 4"
//! url = "https://doc.rust-lang.org/book/ch04-00-understanding-ownership.html"
//! type = "book"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use skillshare_db::models::{Module, Plan, Resource, ResourceType, Task};

use crate::error::{Error as EngineError, Result};

/// Problems found while parsing or validating a payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0} must have a non-blank title")]
    BlankTitle(String),

    #[error("{what} has a negative estimate ({value})")]
    NegativeEstimate { what: String, value: i32 },

    #[error("resource {0:?} must have a non-blank url")]
    BlankUrl(String),
}

impl From<PayloadError> for EngineError {
    fn from(err: PayloadError) -> Self {
        EngineError::ValidationFailed(err.to_string())
    }
}

/// Replaceable plan-level fields. Used both inside [`PlanRequest`] and on
/// its own for metadata updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub estimated_hours: i32,
}

impl PlanMetadata {
    pub fn validate(&self) -> std::result::Result<(), PayloadError> {
        if self.title.trim().is_empty() {
            return Err(PayloadError::BlankTitle("plan".into()));
        }
        non_negative("plan", self.estimated_hours)
    }
}

/// A full plan tree as authored by a user. Carries no ids or progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Request a shared template instead of a personal plan.
    #[serde(default, skip_serializing_if = "is_false")]
    pub template: bool,
    pub plan: PlanMetadata,
    #[serde(default)]
    pub modules: Vec<ModuleRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_hours: i32,
    #[serde(default)]
    pub tasks: Vec<TaskRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_minutes: i32,
    #[serde(default)]
    pub resources: Vec<ResourceRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn non_negative(what: &str, value: i32) -> std::result::Result<(), PayloadError> {
    if value < 0 {
        return Err(PayloadError::NegativeEstimate {
            what: what.to_owned(),
            value,
        });
    }
    Ok(())
}

impl PlanRequest {
    /// Check titles, estimates and resource urls throughout the tree.
    pub fn validate(&self) -> std::result::Result<(), PayloadError> {
        self.plan.validate()?;
        for (mi, module) in self.modules.iter().enumerate() {
            let module_label = format!("module #{}", mi + 1);
            if module.title.trim().is_empty() {
                return Err(PayloadError::BlankTitle(module_label));
            }
            non_negative(&module.title, module.estimated_hours)?;
            for (ti, task) in module.tasks.iter().enumerate() {
                if task.title.trim().is_empty() {
                    return Err(PayloadError::BlankTitle(format!(
                        "task #{} of {module_label}",
                        ti + 1
                    )));
                }
                non_negative(&task.title, task.estimated_minutes)?;
                for resource in &task.resources {
                    if resource.title.trim().is_empty() {
                        return Err(PayloadError::BlankTitle(format!(
                            "a resource of task {:?}",
                            task.title
                        )));
                    }
                    if resource.url.trim().is_empty() {
                        return Err(PayloadError::BlankUrl(resource.title.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Materialize the module subtree, drawing a new id for every node.
    /// All progress starts at zero.
    pub fn build_modules(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Vec<Module>> {
        self.modules
            .iter()
            .map(|m| m.build(&mut *next_id))
            .collect()
    }

    /// The authored shape of an existing plan: ids, ownership and progress
    /// are dropped.
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            template: plan.is_template,
            plan: PlanMetadata {
                title: plan.title.clone(),
                description: plan.description.clone(),
                category: plan.category.clone(),
                estimated_hours: plan.estimated_hours,
            },
            modules: plan.modules.iter().map(ModuleRequest::from_module).collect(),
        }
    }

    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl ModuleRequest {
    fn build(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Module> {
        Ok(Module {
            id: next_id()?,
            title: self.title.clone(),
            description: self.description.clone(),
            estimated_hours: self.estimated_hours,
            completed_hours: 0,
            tasks: self
                .tasks
                .iter()
                .map(|t| t.build(&mut *next_id))
                .collect::<Result<_>>()?,
        })
    }

    fn from_module(module: &Module) -> Self {
        Self {
            title: module.title.clone(),
            description: module.description.clone(),
            estimated_hours: module.estimated_hours,
            tasks: module.tasks.iter().map(TaskRequest::from_task).collect(),
        }
    }
}

impl TaskRequest {
    fn build(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Task> {
        Ok(Task {
            id: next_id()?,
            title: self.title.clone(),
            description: self.description.clone(),
            estimated_minutes: self.estimated_minutes,
            completed_at: None,
            resources: self
                .resources
                .iter()
                .map(|r| {
                    Ok(Resource {
                        id: next_id()?,
                        title: r.title.clone(),
                        url: r.url.clone(),
                        kind: r.kind,
                        notes: r.notes.clone(),
                    })
                })
                .collect::<Result<_>>()?,
        })
    }

    fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            estimated_minutes: task.estimated_minutes,
            resources: task
                .resources
                .iter()
                .map(|r| ResourceRequest {
                    title: r.title.clone(),
                    url: r.url.clone(),
                    kind: r.kind,
                    notes: r.notes.clone(),
                })
                .collect(),
        }
    }
}

/// Parse and validate a plan file.
pub fn parse_plan_toml(content: &str) -> std::result::Result<PlanRequest, PayloadError> {
    let request: PlanRequest = toml::from_str(content)?;
    request.validate()?;
    Ok(request)
}
