//! Template instantiation: structural deep copy with fresh identities.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use skillshare_db::models::{Module, Plan, Resource, Task};

use crate::error::{Error, Result};
use crate::ids::{FreshIds, IdGenerator};

/// A plan-tree node that can copy itself with new ids throughout.
///
/// Copies keep content and ordering but drop all progress: completion
/// timestamps are cleared and completed hours reset to zero.
pub trait FreshCopy: Sized {
    fn fresh_copy(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Self>;
}

impl FreshCopy for Resource {
    fn fresh_copy(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Self> {
        Ok(Resource {
            id: next_id()?,
            title: self.title.clone(),
            url: self.url.clone(),
            kind: self.kind,
            notes: self.notes.clone(),
        })
    }
}

impl FreshCopy for Task {
    fn fresh_copy(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Self> {
        Ok(Task {
            id: next_id()?,
            title: self.title.clone(),
            description: self.description.clone(),
            estimated_minutes: self.estimated_minutes,
            completed_at: None,
            resources: fresh_copies(&self.resources, next_id)?,
        })
    }
}

impl FreshCopy for Module {
    fn fresh_copy(&self, next_id: &mut dyn FnMut() -> Result<Uuid>) -> Result<Self> {
        Ok(Module {
            id: next_id()?,
            title: self.title.clone(),
            description: self.description.clone(),
            estimated_hours: self.estimated_hours,
            completed_hours: 0,
            tasks: fresh_copies(&self.tasks, next_id)?,
        })
    }
}

/// Copy every node of a slice, preserving order.
pub fn fresh_copies<T: FreshCopy>(
    nodes: &[T],
    next_id: &mut dyn FnMut() -> Result<Uuid>,
) -> Result<Vec<T>> {
    nodes.iter().map(|n| n.fresh_copy(&mut *next_id)).collect()
}

/// Every id in the plan: the plan itself and all modules, tasks and
/// resources.
pub fn subtree_ids(plan: &Plan) -> HashSet<Uuid> {
    let mut ids = HashSet::from([plan.id]);
    for module in &plan.modules {
        ids.insert(module.id);
        for task in &module.tasks {
            ids.insert(task.id);
            ids.extend(task.resources.iter().map(|r| r.id));
        }
    }
    ids
}

/// Instantiate `template` as a personal plan owned by `owner_id`.
///
/// The result shares no ids with the template, carries no progress, and is
/// not itself a template. Fails with `InvalidOperation` for non-templates.
pub fn clone_template(
    template: &Plan,
    owner_id: &str,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<Plan> {
    if !template.is_template {
        return Err(Error::InvalidOperation(format!(
            "plan {} is not a template",
            template.id
        )));
    }

    let mut fresh = FreshIds::reserving(ids, subtree_ids(template));
    let id = fresh.next_id()?;
    let modules = fresh_copies(&template.modules, &mut || fresh.next_id())?;

    Ok(Plan {
        id,
        title: template.title.clone(),
        description: template.description.clone(),
        owner_id: owner_id.to_owned(),
        is_template: false,
        category: template.category.clone(),
        estimated_hours: template.estimated_hours,
        completed_hours: 0,
        modules,
        revision: 0,
        created_at: now,
        updated_at: now,
    })
}
