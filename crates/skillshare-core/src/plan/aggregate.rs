//! Completed-hours rollups from task completion up to the plan.
//!
//! Both levels are pure functions of the current tree: a module's
//! `completed_hours` is the floor of its completed task minutes over 60, and
//! a plan's is the sum of its modules'. After a task changes, recompute the
//! owning module before the plan.

use serde::Serialize;

use skillshare_db::models::{Module, Plan, PlanStatus};

const MINUTES_PER_HOUR: i64 = 60;

/// Convert minutes to whole hours, truncating toward negative infinity.
pub fn minutes_to_hours(minutes: i64) -> i32 {
    saturate(minutes.div_euclid(MINUTES_PER_HOUR))
}

/// Sum of `estimated_minutes` over the module's completed tasks.
pub fn completed_minutes(module: &Module) -> i64 {
    module
        .tasks
        .iter()
        .filter(|t| t.is_complete())
        .map(|t| i64::from(t.estimated_minutes))
        .sum()
}

/// Recompute and store `module.completed_hours`; returns the new value.
pub fn recompute_module(module: &mut Module) -> i32 {
    module.completed_hours = minutes_to_hours(completed_minutes(module));
    module.completed_hours
}

/// Recompute and store `plan.completed_hours` from the modules' current
/// values. Does not touch the modules.
pub fn recompute_plan(plan: &mut Plan) -> i32 {
    let total: i64 = plan
        .modules
        .iter()
        .map(|m| i64::from(m.completed_hours))
        .sum();
    plan.completed_hours = saturate(total);
    plan.completed_hours
}

/// Recompute every module, then the plan.
pub fn recompute_all(plan: &mut Plan) -> i32 {
    for module in &mut plan.modules {
        recompute_module(module);
    }
    recompute_plan(plan)
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Read-only progress snapshot of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub completed_hours: i32,
    pub estimated_hours: i32,
    pub status: PlanStatus,
}

impl ProgressSummary {
    pub fn of(plan: &Plan) -> Self {
        Self {
            completed_tasks: plan.completed_task_count(),
            total_tasks: plan.task_count(),
            completed_hours: plan.completed_hours,
            estimated_hours: plan.estimated_hours,
            status: plan.status(),
        }
    }

    /// Completed share of tasks in whole percent; 0 for an empty plan.
    pub fn percent_complete(&self) -> u8 {
        if self.total_tasks == 0 {
            return 0;
        }
        ((self.completed_tasks * 100) / self.total_tasks) as u8
    }
}
