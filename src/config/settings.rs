//! Service settings loading from config.toml and environment variables.
//!
//! Settings resolve in two layers: an optional `config.toml` supplies base
//! values, and environment variables override individual entries. The file is
//! meant for defaults checked into a deployment, the environment for
//! per-instance overrides.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default address the HTTP API binds to
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default `SQLite` database location, created on first run
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/campaign_ledger.sqlite?mode=rwc";

/// Default delay between lifecycle scheduler passes (six hours)
pub const DEFAULT_LIFECYCLE_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Address the HTTP API listens on
    pub bind_addr: String,
    /// Seconds between lifecycle scheduler passes
    pub lifecycle_interval_secs: u64,
    /// Shared secret for operator endpoints, None leaves them disabled
    pub admin_token: Option<String>,
}

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct SettingsFile {
    /// `[database]` section
    #[serde(default)]
    pub database: DatabaseSection,
    /// `[server]` section
    #[serde(default)]
    pub server: ServerSection,
    /// `[scheduler]` section
    #[serde(default)]
    pub scheduler: SchedulerSection,
    /// `[admin]` section
    #[serde(default)]
    pub admin: AdminSection,
}

/// `[database]` settings
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    /// `SeaORM` connection string
    pub url: Option<String>,
}

/// `[server]` settings
#[derive(Debug, Default, Deserialize)]
pub struct ServerSection {
    /// Listen address, e.g. "0.0.0.0:8080"
    pub bind_addr: Option<String>,
}

/// `[scheduler]` settings
#[derive(Debug, Default, Deserialize)]
pub struct SchedulerSection {
    /// Seconds between lifecycle passes
    pub lifecycle_interval_secs: Option<u64>,
}

/// `[admin]` settings
#[derive(Debug, Default, Deserialize)]
pub struct AdminSection {
    /// Shared secret expected in the `x-admin-token` header
    pub token: Option<String>,
}

/// Environment variable overrides, the highest-precedence layer
#[derive(Debug, Default)]
pub struct EnvOverrides {
    /// `DATABASE_URL`
    pub database_url: Option<String>,
    /// `BIND_ADDR`
    pub bind_addr: Option<String>,
    /// `LIFECYCLE_INTERVAL_SECS`, parsed during resolution
    pub lifecycle_interval_secs: Option<String>,
    /// `ADMIN_TOKEN`
    pub admin_token: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok(),
            bind_addr: std::env::var("BIND_ADDR").ok(),
            lifecycle_interval_secs: std::env::var("LIFECYCLE_INTERVAL_SECS").ok(),
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
        }
    }
}

/// Loads a settings file from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_settings_file<P: AsRef<Path>>(path: P) -> Result<SettingsFile> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

impl Settings {
    /// Loads settings from `./config.toml` (when present) and the environment.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed, or if an
    /// override value fails validation.
    pub fn load() -> Result<Self> {
        let file = if Path::new("config.toml").exists() {
            load_settings_file("config.toml")?
        } else {
            SettingsFile::default()
        };
        Self::resolve(file, EnvOverrides::from_env())
    }

    /// Merges file values and environment overrides into resolved settings.
    ///
    /// Precedence per entry: environment variable, then file value, then the
    /// built-in default.
    ///
    /// # Errors
    /// Returns an error if the lifecycle interval fails to parse or is zero.
    pub fn resolve(file: SettingsFile, env: EnvOverrides) -> Result<Self> {
        let lifecycle_interval_secs = match env.lifecycle_interval_secs {
            Some(raw) => raw.parse().map_err(|e| Error::Config {
                message: format!("Invalid LIFECYCLE_INTERVAL_SECS '{raw}': {e}"),
            })?,
            None => file
                .scheduler
                .lifecycle_interval_secs
                .unwrap_or(DEFAULT_LIFECYCLE_INTERVAL_SECS),
        };
        if lifecycle_interval_secs == 0 {
            return Err(Error::Config {
                message: "lifecycle interval must be at least one second".to_string(),
            });
        }

        Ok(Self {
            database_url: env
                .database_url
                .or(file.database.url)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: env
                .bind_addr
                .or(file.server.bind_addr)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            lifecycle_interval_secs,
            admin_token: env.admin_token.or(file.admin.token),
        })
    }
}
