//! CLI handlers for user profiles and the follow graph.
//!
//! Implements:
//! - `skillshare user add <id> --email <email> --name <name>`
//! - `skillshare user show [id]`
//! - `skillshare user update --name <name>`
//! - `skillshare user followers [id]` / `skillshare user following [id]`
//! - `skillshare follow <id>` / `skillshare unfollow <id>`

use anyhow::Result;

use skillshare_core::social::{FollowService, UserSummary};
use skillshare_core::store::UserStore;
use skillshare_db::models::UserProfile;

use crate::UserCommands;
use crate::config::SkillshareConfig;

pub async fn run_user_command<U: UserStore>(
    command: UserCommands,
    service: &FollowService<U>,
    config: &SkillshareConfig,
) -> Result<()> {
    match command {
        UserCommands::Add { id, email, name } => {
            let user = service.register(&id, &email, &name).await?;
            println!("User {} registered.", user.id);
            Ok(())
        }
        UserCommands::Show { id } => {
            let id = match id {
                Some(id) => id,
                None => config.require_user()?.to_owned(),
            };
            let profile = service.profile(&id).await?;
            print_profile(&profile);
            Ok(())
        }
        UserCommands::Update { name } => {
            let profile = service.update_profile(config.require_user()?, &name).await?;
            println!("Display name of {} is now {:?}.", profile.id, profile.display_name);
            Ok(())
        }
        UserCommands::Followers { id } => {
            let viewer = config.require_user()?;
            let id = id.as_deref().unwrap_or(viewer);
            print_summaries(&service.followers(viewer, id).await?);
            Ok(())
        }
        UserCommands::Following { id } => {
            let viewer = config.require_user()?;
            let id = id.as_deref().unwrap_or(viewer);
            print_summaries(&service.following(viewer, id).await?);
            Ok(())
        }
    }
}

pub async fn run_follow<U: UserStore>(service: &FollowService<U>, user: &str, target: &str) -> Result<()> {
    let me = service.follow(user, target).await?;
    println!("{user} now follows {target} (following {}).", me.following_count);
    Ok(())
}

pub async fn run_unfollow<U: UserStore>(service: &FollowService<U>, user: &str, target: &str) -> Result<()> {
    let me = service.unfollow(user, target).await?;
    println!("{user} no longer follows {target} (following {}).", me.following_count);
    Ok(())
}

fn print_summaries(users: &[UserSummary]) {
    if users.is_empty() {
        println!("No users.");
        return;
    }
    let id_w = users.iter().map(|u| u.id.len()).max().unwrap_or(2).max(2);
    let name_w = users.iter().map(|u| u.display_name.len()).max().unwrap_or(4).max(4);
    println!("{:<id_w$}  {:<name_w$}  {:>9}  {:>9}  YOU FOLLOW", "ID", "NAME", "FOLLOWERS", "FOLLOWING");
    for user in users {
        println!(
            "{:<id_w$}  {:<name_w$}  {:>9}  {:>9}  {}",
            user.id,
            user.display_name,
            user.follower_count,
            user.following_count,
            if user.followed_by_viewer { "yes" } else { "no" },
        );
    }
}

fn print_profile(profile: &UserProfile) {
    println!("User: {}", profile.display_name);
    println!("  ID:         {}", profile.id);
    println!("  Email:      {}", profile.email);
    println!("  Following:  {}", profile.following_count);
    for id in &profile.following {
        println!("    - {id}");
    }
    println!("  Followers:  {}", profile.follower_count);
    for id in &profile.followers {
        println!("    - {id}");
    }
    println!("  Joined:     {}", profile.created_at.format("%Y-%m-%d"));
}
