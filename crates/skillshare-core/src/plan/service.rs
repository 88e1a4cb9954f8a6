//! Plan lifecycle operations.
//!
//! Every operation takes the requester's identity explicitly, reads at most
//! one plan record, mutates an in-memory copy and writes it back in a single
//! [`PlanStore::save`]. A failed operation writes nothing.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use skillshare_db::models::{Plan, PlanStatus, SYSTEM_OWNER};

use super::aggregate::{self, ProgressSummary};
use super::clone::clone_template;
use super::payload::{PlanMetadata, PlanRequest};
use crate::error::{Entity, Error, Result};
use crate::ids::{FreshIds, IdGenerator, RandomIds};
use crate::store::PlanStore;

/// Compact view of a template for catalogue listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub estimated_hours: i32,
    pub module_count: usize,
    pub task_count: usize,
}

impl From<&Plan> for TemplateSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            title: plan.title.clone(),
            description: plan.description.clone(),
            category: plan.category.clone(),
            estimated_hours: plan.estimated_hours,
            module_count: plan.modules.len(),
            task_count: plan.task_count(),
        }
    }
}

/// Criteria for [`PlanService::list_filtered`]. Unset fields match
/// everything; set fields must all match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanFilter {
    /// Case-insensitive exact match on the plan category.
    pub category: Option<String>,
    /// Inclusive lower bound on `estimated_hours`.
    pub min_hours: Option<i32>,
    /// Inclusive upper bound on `estimated_hours`.
    pub max_hours: Option<i32>,
    pub status: Option<PlanStatus>,
}

impl PlanFilter {
    pub fn validate(&self) -> Result<()> {
        match (self.min_hours, self.max_hours) {
            (Some(min), Some(max)) if min > max => Err(Error::ValidationFailed(format!(
                "min_hours ({min}) is greater than max_hours ({max})"
            ))),
            _ => Ok(()),
        }
    }

    pub fn matches(&self, plan: &Plan) -> bool {
        let category_ok = self.category.as_deref().is_none_or(|wanted| {
            plan.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        });
        category_ok
            && self.min_hours.is_none_or(|min| plan.estimated_hours >= min)
            && self.max_hours.is_none_or(|max| plan.estimated_hours <= max)
            && self.status.is_none_or(|s| plan.status() == s)
    }
}

/// The plan lifecycle manager.
pub struct PlanService<S> {
    store: S,
    ids: Box<dyn IdGenerator>,
}

impl<S: PlanStore> PlanService<S> {
    /// A service that mints random v4 ids.
    pub fn new(store: S) -> Self {
        Self::with_id_generator(store, RandomIds)
    }

    pub fn with_id_generator(store: S, ids: impl IdGenerator + 'static) -> Self {
        Self {
            store,
            ids: Box::new(ids),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a plan owned by `requester` from an authored payload.
    ///
    /// Every node gets a fresh id and zero progress. Only the system
    /// identity may create templates.
    pub async fn create(&self, requester: &str, request: &PlanRequest) -> Result<Plan> {
        request.validate()?;
        if request.template && requester != SYSTEM_OWNER {
            return Err(Error::InvalidOperation(format!(
                "user {requester:?} may not create templates"
            )));
        }

        let mut fresh = FreshIds::new(self.ids.as_ref());
        let id = fresh.next_id()?;
        let modules = request.build_modules(&mut || fresh.next_id())?;
        let now = Utc::now();

        let plan = Plan {
            id,
            title: request.plan.title.clone(),
            description: request.plan.description.clone(),
            owner_id: requester.to_owned(),
            is_template: request.template,
            category: request.plan.category.clone(),
            estimated_hours: request.plan.estimated_hours,
            completed_hours: 0,
            modules,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let saved = self.store.save(&plan).await?;
        info!(
            plan_id = %saved.id,
            owner = %saved.owner_id,
            template = saved.is_template,
            modules = saved.modules.len(),
            "plan created"
        );
        Ok(saved)
    }

    /// Fetch a plan the requester may read: any template, or a plan they own.
    pub async fn get(&self, requester: &str, plan_id: Uuid) -> Result<Plan> {
        let plan = self.load_existing(plan_id).await?;
        if plan.is_template || plan.is_owned_by(requester) {
            Ok(plan)
        } else {
            Err(Error::not_authorized(requester, "read", Entity::Plan, plan_id))
        }
    }

    /// The requester's personal (non-template) plans, newest first.
    pub async fn list_for_user(&self, requester: &str) -> Result<Vec<Plan>> {
        self.store.list_by_owner(requester).await
    }

    pub async fn list_filtered(&self, requester: &str, filter: &PlanFilter) -> Result<Vec<Plan>> {
        filter.validate()?;
        let mut plans = self.store.list_by_owner(requester).await?;
        plans.retain(|p| filter.matches(p));
        Ok(plans)
    }

    /// Mark a task complete and roll its minutes up into the module and the
    /// plan.
    ///
    /// Completing an already-complete task keeps its original timestamp and
    /// writes nothing.
    pub async fn update_progress(
        &self,
        requester: &str,
        plan_id: Uuid,
        module_id: Uuid,
        task_id: Uuid,
    ) -> Result<Plan> {
        let mut plan = self.load_owned(requester, plan_id, "update progress on").await?;
        if plan.is_template {
            return Err(Error::InvalidOperation(format!(
                "cannot record progress on template {plan_id}"
            )));
        }

        let now = Utc::now();
        let module = plan
            .module_mut(module_id)
            .ok_or_else(|| Error::not_found(Entity::Module, module_id))?;
        let task = module
            .task_mut(task_id)
            .ok_or_else(|| Error::not_found(Entity::Task, task_id))?;

        if task.is_complete() {
            debug!(%plan_id, %task_id, "task already complete");
            return Ok(plan);
        }
        task.completed_at = Some(now);
        aggregate::recompute_module(module);
        aggregate::recompute_plan(&mut plan);
        plan.updated_at = now;

        let saved = self.store.save(&plan).await?;
        info!(
            %plan_id,
            %module_id,
            %task_id,
            completed_hours = saved.completed_hours,
            "task completed"
        );
        Ok(saved)
    }

    /// Replace the plan-level fields. The module tree and progress are left
    /// untouched.
    pub async fn update_metadata(
        &self,
        requester: &str,
        plan_id: Uuid,
        metadata: &PlanMetadata,
    ) -> Result<Plan> {
        metadata.validate()?;
        let mut plan = self.load_owned(requester, plan_id, "update").await?;

        plan.title = metadata.title.clone();
        plan.description = metadata.description.clone();
        plan.category = metadata.category.clone();
        plan.estimated_hours = metadata.estimated_hours;
        plan.updated_at = Utc::now();

        let saved = self.store.save(&plan).await?;
        info!(%plan_id, "plan metadata updated");
        Ok(saved)
    }

    pub async fn delete(&self, requester: &str, plan_id: Uuid) -> Result<()> {
        self.load_owned(requester, plan_id, "delete").await?;
        if !self.store.delete(plan_id).await? {
            return Err(Error::not_found(Entity::Plan, plan_id));
        }
        info!(%plan_id, "plan deleted");
        Ok(())
    }

    /// Copy a template into a new personal plan for the requester.
    pub async fn instantiate_template(&self, requester: &str, template_id: Uuid) -> Result<Plan> {
        let template = self
            .store
            .load(template_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Template, template_id))?;

        let plan = clone_template(&template, requester, self.ids.as_ref(), Utc::now())?;
        let saved = self.store.save(&plan).await?;
        info!(%template_id, plan_id = %saved.id, owner = requester, "template instantiated");
        Ok(saved)
    }

    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>> {
        let templates = self.store.list_templates().await?;
        Ok(templates.iter().map(TemplateSummary::from).collect())
    }

    pub async fn progress(&self, requester: &str, plan_id: Uuid) -> Result<ProgressSummary> {
        let plan = self.get(requester, plan_id).await?;
        Ok(ProgressSummary::of(&plan))
    }

    async fn load_existing(&self, plan_id: Uuid) -> Result<Plan> {
        self.store
            .load(plan_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Plan, plan_id))
    }

    async fn load_owned(&self, requester: &str, plan_id: Uuid, action: &'static str) -> Result<Plan> {
        let plan = self.load_existing(plan_id).await?;
        if !plan.is_owned_by(requester) {
            return Err(Error::not_authorized(requester, action, Entity::Plan, plan_id));
        }
        Ok(plan)
    }
}
