//! Configuration file management for skillshare.
//!
//! Provides a TOML-based config file at `~/.config/skillshare/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use skillshare_db::config::DbConfig;

/// Env var naming the acting user when `--user` is not given.
pub const USER_ENV: &str = "SKILLSHARE_USER";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub identity: IdentitySection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IdentitySection {
    /// Default acting user for plan and follow commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the skillshare config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/skillshare` or
/// `~/.config/skillshare`, including on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("skillshare");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("skillshare")
}

/// Return the path to the skillshare config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    // The database URL may carry a password.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct SkillshareConfig {
    pub db_config: DbConfig,
    pub user: Option<String>,
}

impl SkillshareConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `SKILLSHARE_DATABASE_URL` env > `database.url` > `DbConfig::DEFAULT_URL`
    /// - User: `cli_user` > `SKILLSHARE_USER` env > `identity.user` > none
    pub fn resolve(cli_db_url: Option<&str>, cli_user: Option<&str>) -> Result<Self> {
        Ok(Self::resolve_with(cli_db_url, cli_user, load_config().ok()))
    }

    fn resolve_with(cli_db_url: Option<&str>, cli_user: Option<&str>, file_config: Option<ConfigFile>) -> Self {
        let (file_url, file_user) = match file_config {
            Some(cfg) => (Some(cfg.database.url), cfg.identity.user),
            None => (None, None),
        };

        let db_url = first_set([cli_db_url.map(str::to_owned), env_value(DbConfig::URL_ENV), file_url])
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());
        let user = first_set([cli_user.map(str::to_owned), env_value(USER_ENV), file_user]);

        Self {
            db_config: DbConfig::new(db_url),
            user,
        }
    }

    /// The acting user, or an error explaining how to set one.
    pub fn require_user(&self) -> Result<&str> {
        match self.user.as_deref() {
            Some(user) => Ok(user),
            None => bail!(
                "no acting user; pass --user, set {USER_ENV}, or run `skillshare init --user <id>`"
            ),
        }
    }
}

/// The first layer that holds a non-blank value.
fn first_set<const N: usize>(layers: [Option<String>; N]) -> Option<String> {
    layers.into_iter().flatten().find(|value| !value.trim().is_empty())
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
