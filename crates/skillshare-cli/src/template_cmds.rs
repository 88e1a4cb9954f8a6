//! CLI handlers for `skillshare template` subcommands.
//!
//! Implements:
//! - `skillshare template list`       -- show the template catalogue
//! - `skillshare template use <id>`   -- start a personal plan from a template
//! - `skillshare template seed`       -- install the built-in templates

use anyhow::Result;

use skillshare_core::plan::{PlanService, seed_templates};
use skillshare_core::store::PlanStore;

use crate::TemplateCommands;
use crate::config::SkillshareConfig;
use crate::resolve::parse_id;

pub async fn run_template_command<S: PlanStore>(
    command: TemplateCommands,
    service: &PlanService<S>,
    config: &SkillshareConfig,
) -> Result<()> {
    match command {
        TemplateCommands::List => cmd_list(service).await,
        TemplateCommands::Use { template_id } => {
            cmd_use(service, config.require_user()?, &template_id).await
        }
        TemplateCommands::Seed => cmd_seed(service).await,
    }
}

async fn cmd_list<S: PlanStore>(service: &PlanService<S>) -> Result<()> {
    let templates = service.list_templates().await?;

    if templates.is_empty() {
        println!("No templates found. Use `skillshare template seed` to install the built-in ones.");
        return Ok(());
    }

    let id_w = 36;
    let title_w = templates.iter().map(|t| t.title.len()).max().unwrap_or(5).max(5);
    let cat_w = templates
        .iter()
        .map(|t| t.category.as_deref().map_or(1, str::len))
        .max()
        .unwrap_or(8)
        .max(8);

    println!(
        "{:<id_w$}  {:<title_w$}  {:<cat_w$}  {:>7}  {:>5}  {:>5}",
        "ID", "TITLE", "CATEGORY", "MODULES", "TASKS", "HOURS",
    );
    for t in &templates {
        println!(
            "{:<id_w$}  {:<title_w$}  {:<cat_w$}  {:>7}  {:>5}  {:>5}",
            t.id,
            t.title,
            t.category.as_deref().unwrap_or("-"),
            t.module_count,
            t.task_count,
            t.estimated_hours,
        );
    }

    Ok(())
}

async fn cmd_use<S: PlanStore>(service: &PlanService<S>, user: &str, template_id: &str) -> Result<()> {
    let template_id = parse_id("template", template_id)?;
    let plan = service.instantiate_template(user, template_id).await?;

    println!("Plan created from template.");
    println!();
    println!("  Plan ID:   {}", plan.id);
    println!("  Title:     {}", plan.title);
    println!("  Modules:   {}", plan.modules.len());
    println!("  Tasks:     {}", plan.task_count());

    Ok(())
}

async fn cmd_seed<S: PlanStore>(service: &PlanService<S>) -> Result<()> {
    let created = seed_templates(service).await?;
    if created.is_empty() {
        println!("Templates already present; nothing to seed.");
    } else {
        println!("Seeded {} templates:", created.len());
        for plan in &created {
            println!("  {}  {}", plan.id, plan.title);
        }
    }
    Ok(())
}
