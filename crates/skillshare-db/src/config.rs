use std::env;
use std::time::Duration;

/// Connection settings for the plan and profile database.
///
/// Built from `SKILLSHARE_DATABASE_URL` (and the optional pool tuning
/// variables below) or from an explicit URL passed on the command line.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL, possibly with a `?query` suffix.
    pub database_url: String,
    /// Upper bound on pooled connections (`SKILLSHARE_DB_MAX_CONNECTIONS`).
    pub max_connections: u32,
    /// How long to wait for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/skillshare";
    pub const URL_ENV: &str = "SKILLSHARE_DATABASE_URL";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a config from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let database_url = env::var(Self::URL_ENV)
            .unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let max_connections = env::var("SKILLSHARE_DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(Self::DEFAULT_MAX_CONNECTIONS);
        Self {
            database_url,
            max_connections,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Build a config from an explicit URL with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// The URL without its `?query` suffix.
    fn base_url(&self) -> &str {
        match self.database_url.split_once('?') {
            Some((base, _)) => base,
            None => &self.database_url,
        }
    }

    /// Extract the database name from the URL.
    ///
    /// Returns `None` when the URL has no path component after the host.
    pub fn database_name(&self) -> Option<&str> {
        let base = self.base_url();
        let after_scheme = base.split_once("://").map_or(base, |(_, rest)| rest);
        after_scheme
            .split_once('/')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty() && !name.contains('/'))
    }

    /// URL of the `postgres` maintenance database on the same server,
    /// keeping any query parameters. Used to issue `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        let base = self.base_url();
        let query = &self.database_url[base.len()..];
        match base.rfind('/') {
            Some(pos) if self.database_name().is_some() => {
                format!("{}/postgres{query}", &base[..pos])
            }
            _ => format!("{base}/postgres{query}"),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
