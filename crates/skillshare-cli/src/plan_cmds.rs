//! CLI handlers for `skillshare plan` subcommands.
//!
//! Implements:
//! - `skillshare plan create <file>`     -- create a plan from a TOML file
//! - `skillshare plan show [plan-id]`    -- show one plan or list your plans
//! - `skillshare plan list [filters]`    -- list your plans by category, hours or status
//! - `skillshare plan progress <plan> <module> <task>` -- complete a task
//! - `skillshare plan update <plan-id>`  -- edit title, description, category or hours
//! - `skillshare plan delete <plan-id>`  -- delete a plan
//! - `skillshare plan export <plan-id>`  -- write a plan back out as TOML

use anyhow::{Context, Result};

use skillshare_core::plan::{PlanFilter, PlanMetadata, PlanRequest, PlanService, parse_plan_toml};
use skillshare_core::store::PlanStore;
use skillshare_db::models::{Plan, PlanStatus};

use crate::PlanCommands;
use crate::resolve::parse_id;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler, acting as
/// `user`.
pub async fn run_plan_command<S: PlanStore>(
    command: PlanCommands,
    service: &PlanService<S>,
    user: &str,
) -> Result<()> {
    match command {
        PlanCommands::Create { file } => cmd_create(service, user, &file).await,
        PlanCommands::Show { plan_id } => match plan_id {
            Some(id) => cmd_show_one(service, user, &id).await,
            None => cmd_list(service, user, &PlanFilter::default()).await,
        },
        PlanCommands::List {
            category,
            min_hours,
            max_hours,
            status,
        } => {
            let status = status
                .map(|s| s.parse::<PlanStatus>())
                .transpose()
                .context("invalid --status")?;
            let filter = PlanFilter {
                category,
                min_hours,
                max_hours,
                status,
            };
            cmd_list(service, user, &filter).await
        }
        PlanCommands::Progress {
            plan_id,
            module_id,
            task_id,
        } => cmd_progress(service, user, &plan_id, &module_id, &task_id).await,
        PlanCommands::Update {
            plan_id,
            title,
            description,
            category,
            estimated_hours,
        } => {
            let changes = MetadataChanges {
                title,
                description,
                category,
                estimated_hours,
            };
            cmd_update(service, user, &plan_id, changes).await
        }
        PlanCommands::Delete { plan_id } => cmd_delete(service, user, &plan_id).await,
        PlanCommands::Export { plan_id, output } => {
            cmd_export(service, user, &plan_id, output.as_deref()).await
        }
    }
}

// -----------------------------------------------------------------------
// skillshare plan create <file>
// -----------------------------------------------------------------------

/// Read a plan TOML from disk, validate it, store it and print a summary.
async fn cmd_create<S: PlanStore>(service: &PlanService<S>, user: &str, file_path: &str) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read plan file: {file_path}"))?;

    let request = parse_plan_toml(&content)
        .with_context(|| format!("failed to parse plan file: {file_path}"))?;

    let plan = service.create(user, &request).await?;

    println!("Plan created successfully.");
    println!();
    println!("  Plan ID:   {}", plan.id);
    println!("  Title:     {}", plan.title);
    println!("  Template:  {}", plan.is_template);
    println!("  Modules:   {}", plan.modules.len());
    println!("  Tasks:     {}", plan.task_count());

    Ok(())
}

// -----------------------------------------------------------------------
// skillshare plan show / list
// -----------------------------------------------------------------------

/// List the user's plans with summary info.
async fn cmd_list<S: PlanStore>(service: &PlanService<S>, user: &str, filter: &PlanFilter) -> Result<()> {
    let plans = service.list_filtered(user, filter).await?;

    if plans.is_empty() {
        println!("No plans found. Use `skillshare plan create <file>` or `skillshare template use <id>`.");
        return Ok(());
    }

    print_plan_table(&plans);
    Ok(())
}

pub(crate) fn print_plan_table(plans: &[Plan]) {
    // ID is always 36 chars (UUID). Status max is 11 (not_started).
    let id_w = 36;
    let title_w = plans.iter().map(|p| p.title.len()).max().unwrap_or(5).max(5);
    let status_w = 11;

    println!(
        "{:<id_w$}  {:<title_w$}  {:<status_w$}  {:>5}  {:>9}  CREATED",
        "ID", "TITLE", "STATUS", "TASKS", "HOURS",
    );

    for plan in plans {
        let tasks = format!("{}/{}", plan.completed_task_count(), plan.task_count());
        let hours = format!("{}/{}", plan.completed_hours, plan.estimated_hours);
        println!(
            "{:<id_w$}  {:<title_w$}  {:<status_w$}  {:>5}  {:>9}  {}",
            plan.id,
            plan.title,
            plan.status().to_string(),
            tasks,
            hours,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        );
    }
}

/// Show the full module/task tree of one plan.
async fn cmd_show_one<S: PlanStore>(service: &PlanService<S>, user: &str, plan_id: &str) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let plan = service.get(user, plan_id).await?;
    let summary = service.progress(user, plan_id).await?;

    println!("Plan: {}", plan.title);
    println!("  ID:        {}", plan.id);
    println!("  Owner:     {}", plan.owner_id);
    if plan.is_template {
        println!("  Template:  yes");
    }
    if let Some(category) = &plan.category {
        println!("  Category:  {category}");
    }
    println!("  Status:    {}", summary.status);
    println!(
        "  Progress:  {}/{} tasks ({}%), {}/{} hours",
        summary.completed_tasks,
        summary.total_tasks,
        summary.percent_complete(),
        summary.completed_hours,
        summary.estimated_hours,
    );
    println!("  Created:   {}", plan.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:   {}", plan.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(desc) = plan.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        println!("  Description:");
        for line in desc.lines() {
            println!("    {line}");
        }
    }

    for module in &plan.modules {
        println!();
        println!(
            "  Module: {} ({}/{} h)",
            module.title, module.completed_hours, module.estimated_hours
        );
        println!("    ID: {}", module.id);
        for task in &module.tasks {
            let mark = if task.is_complete() { "x" } else { " " };
            println!("    [{mark}] {} ({} min)", task.title, task.estimated_minutes);
            println!("        ID: {}", task.id);
            if let Some(done) = task.completed_at {
                println!("        Completed: {}", done.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            for resource in &task.resources {
                println!("        - [{}] {} <{}>", resource.kind, resource.title, resource.url);
            }
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// skillshare plan progress <plan> <module> <task>
// -----------------------------------------------------------------------

async fn cmd_progress<S: PlanStore>(
    service: &PlanService<S>,
    user: &str,
    plan_id: &str,
    module_id: &str,
    task_id: &str,
) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let module_id = parse_id("module", module_id)?;
    let task_id = parse_id("task", task_id)?;

    let plan = service.update_progress(user, plan_id, module_id, task_id).await?;
    let module = plan
        .module(module_id)
        .with_context(|| format!("module {module_id} missing after update"))?;

    println!("Task completed.");
    println!();
    println!("  Module hours:  {}/{}", module.completed_hours, module.estimated_hours);
    println!("  Plan hours:    {}/{}", plan.completed_hours, plan.estimated_hours);
    println!("  Status:        {}", plan.status());

    Ok(())
}

// -----------------------------------------------------------------------
// skillshare plan update <plan-id>
// -----------------------------------------------------------------------

/// Field edits from the command line; unset fields keep their value.
#[derive(Debug, Default)]
pub struct MetadataChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub estimated_hours: Option<i32>,
}

impl MetadataChanges {
    /// Apply the edits on top of the plan's current metadata. An empty
    /// string clears an optional field.
    pub fn apply_to(self, plan: &Plan) -> PlanMetadata {
        let clearable = |new: Option<String>, old: &Option<String>| match new {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(v),
            None => old.clone(),
        };
        PlanMetadata {
            title: self.title.unwrap_or_else(|| plan.title.clone()),
            description: clearable(self.description, &plan.description),
            category: clearable(self.category, &plan.category),
            estimated_hours: self.estimated_hours.unwrap_or(plan.estimated_hours),
        }
    }
}

async fn cmd_update<S: PlanStore>(
    service: &PlanService<S>,
    user: &str,
    plan_id: &str,
    changes: MetadataChanges,
) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let current = service.get(user, plan_id).await?;
    let metadata = changes.apply_to(&current);
    let plan = service.update_metadata(user, plan_id, &metadata).await?;

    println!("Plan updated.");
    println!();
    println!("  Title:     {}", plan.title);
    println!("  Category:  {}", plan.category.as_deref().unwrap_or("-"));
    println!("  Hours:     {}", plan.estimated_hours);

    Ok(())
}

// -----------------------------------------------------------------------
// skillshare plan delete <plan-id>
// -----------------------------------------------------------------------

async fn cmd_delete<S: PlanStore>(service: &PlanService<S>, user: &str, plan_id: &str) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    service.delete(user, plan_id).await?;
    println!("Plan {plan_id} deleted.");
    Ok(())
}

// -----------------------------------------------------------------------
// skillshare plan export <plan-id> [--output <file>]
// -----------------------------------------------------------------------

/// Write a plan as a TOML file that `plan create` accepts.
async fn cmd_export<S: PlanStore>(
    service: &PlanService<S>,
    user: &str,
    plan_id: &str,
    output: Option<&str>,
) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let plan = service.get(user, plan_id).await?;
    let toml_content = PlanRequest::from_plan(&plan)
        .to_toml()
        .context("failed to serialize plan")?;

    match output {
        Some(path) => {
            std::fs::write(path, &toml_content)
                .with_context(|| format!("failed to write to {path}"))?;
            println!("Plan exported to {path}");
        }
        None => {
            print!("{toml_content}");
        }
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
