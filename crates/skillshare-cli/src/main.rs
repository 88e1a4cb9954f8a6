mod config;
mod note_cmds;
mod plan_cmds;
mod resolve;
mod template_cmds;
mod user_cmds;

use clap::{Parser, Subcommand};

use skillshare_core::notes::NoteService;
use skillshare_core::plan::PlanService;
use skillshare_core::social::FollowService;
use skillshare_core::store::{PgNoteStore, PgPlanStore, PgUserStore};
use skillshare_db::pool;

use config::SkillshareConfig;

#[derive(Parser)]
#[command(name = "skillshare", about = "Learning plans, templates and progress tracking")]
struct Cli {
    /// Database URL (overrides SKILLSHARE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Acting user id (overrides SKILLSHARE_USER env var)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a skillshare config file (no database required); `--user` is
    /// stored as the default acting user
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/skillshare")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create and migrate the skillshare database
    DbInit,
    /// Personal plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Template catalogue
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// User profiles
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Personal notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Follow another user
    Follow {
        /// User id to follow
        user_id: String,
    },
    /// Stop following a user
    Unfollow {
        /// User id to unfollow
        user_id: String,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a plan from a TOML file
    Create {
        /// Path to the plan TOML file
        file: String,
    },
    /// Show plan details (or list your plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<String>,
    },
    /// List your plans, optionally filtered
    List {
        /// Category, matched case-insensitively
        #[arg(long)]
        category: Option<String>,
        /// Minimum estimated hours (inclusive)
        #[arg(long)]
        min_hours: Option<i32>,
        /// Maximum estimated hours (inclusive)
        #[arg(long)]
        max_hours: Option<i32>,
        /// Status: not_started, in_progress, completed
        #[arg(long)]
        status: Option<String>,
    },
    /// Mark a task as completed
    Progress {
        plan_id: String,
        module_id: String,
        task_id: String,
    },
    /// Edit plan title, description, category or estimated hours
    Update {
        plan_id: String,
        #[arg(long)]
        title: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        description: Option<String>,
        /// Pass an empty string to clear
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        estimated_hours: Option<i32>,
    },
    /// Delete a plan
    Delete { plan_id: String },
    /// Export a plan as TOML
    Export {
        /// Plan ID to export
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List available templates
    List,
    /// Start a personal plan from a template
    Use { template_id: String },
    /// Install the built-in templates into an empty catalogue
    Seed,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user profile
    Add {
        id: String,
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
    },
    /// Show a profile (defaults to the acting user)
    Show { id: Option<String> },
    /// Change the acting user's display name
    Update {
        #[arg(long)]
        name: String,
    },
    /// List who follows a user (defaults to the acting user)
    Followers { id: Option<String> },
    /// List who a user follows (defaults to the acting user)
    Following { id: Option<String> },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Write a new note
    Add {
        title: String,
        /// Note body
        #[arg(long, default_value = "")]
        content: String,
    },
    /// List your notes, most recently updated first
    List,
    /// Show one note
    Show { note_id: String },
    /// Find notes whose title or body contains the text
    Search { query: String },
    /// Replace a note's title and body
    Edit {
        note_id: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    /// Delete a note
    Delete { note_id: String },
}

/// Execute the `skillshare init` command: write config file.
fn cmd_init(db_url: &str, default_user: Option<String>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        identity: config::IdentitySection {
            user: default_user.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if let Some(user) = default_user {
        println!("  identity.user = {user}");
    }
    println!();
    println!("Next: run `skillshare db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `skillshare db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &SkillshareConfig) -> anyhow::Result<()> {
    println!("Initializing skillshare database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let summary = pool::store_summary(&db_pool).await?;
    println!("Database ready.");
    println!("  templates:      {}", summary.templates);
    println!("  personal plans: {}", summary.personal_plans);
    println!("  users:          {}", summary.users);
    println!("  notes:          {}", summary.notes);

    db_pool.close().await;

    println!("skillshare db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Init { db_url, force } => return cmd_init(&db_url, cli.user, force),
        command => command,
    };

    let resolved = SkillshareConfig::resolve(cli.database_url.as_deref(), cli.user.as_deref())?;
    tracing::debug!(
        database = resolved.db_config.database_name().unwrap_or("?"),
        user = resolved.user.as_deref().unwrap_or("-"),
        "resolved configuration"
    );
    if let Commands::DbInit = command {
        return cmd_db_init(&resolved).await;
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let result = run_command(command, &resolved, &db_pool).await;
    db_pool.close().await;
    result
}

/// Run a command that needs a connected database.
async fn run_command(
    command: Commands,
    resolved: &SkillshareConfig,
    db_pool: &sqlx::PgPool,
) -> anyhow::Result<()> {
    let plans = || PlanService::new(PgPlanStore::new(db_pool.clone()));
    let users = || FollowService::new(PgUserStore::new(db_pool.clone()));
    let notes = || NoteService::new(PgNoteStore::new(db_pool.clone()));

    match command {
        Commands::Plan { command } => {
            plan_cmds::run_plan_command(command, &plans(), resolved.require_user()?).await
        }
        Commands::Template { command } => {
            template_cmds::run_template_command(command, &plans(), resolved).await
        }
        Commands::User { command } => user_cmds::run_user_command(command, &users(), resolved).await,
        Commands::Note { command } => {
            note_cmds::run_note_command(command, &notes(), resolved.require_user()?).await
        }
        Commands::Follow { user_id } => {
            user_cmds::run_follow(&users(), resolved.require_user()?, &user_id).await
        }
        Commands::Unfollow { user_id } => {
            user_cmds::run_unfollow(&users(), resolved.require_user()?, &user_id).await
        }
        Commands::Init { .. } | Commands::DbInit => {
            unreachable!("handled before connecting to the database")
        }
    }
}
