//! CLI configuration
//!
//! Loaded from an optional TOML file; command-line flags override it.
//!
//! ```toml
//! database = "restore.db"
//! log_profile = "production"
//! apply_migrations = true
//! ```

use clap::Args;
use qmatrix_core::logging_facility::{init, Profile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE: &str = ".qmatrix/restore.db";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestoreConfig {
    pub database: PathBuf,
    pub log_profile: String,
    pub apply_migrations: bool,
}

impl Default for RestoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            log_profile: "development".to_string(),
            apply_migrations: true,
        }
    }
}

impl RestoreConfig {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(toml::from_str(content)?)
    }

    pub fn profile(&self) -> Profile {
        Profile::parse(&self.log_profile)
    }
}

/// Flags shared by commands that touch the database
#[derive(Debug, Args)]
pub struct DbArgs {
    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Logging profile: development or production (overrides config)
    #[arg(long)]
    pub log_profile: Option<String>,

    /// Skip applying pending migrations
    #[arg(long)]
    pub no_migrate: bool,
}

impl DbArgs {
    /// Resolve the effective config: defaults, then file, then flags
    pub fn resolve(&self) -> Result<RestoreConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => RestoreConfig::load(path)?,
            None => RestoreConfig::default(),
        };
        if let Some(db) = &self.db {
            config.database = db.clone();
        }
        if let Some(profile) = &self.log_profile {
            config.log_profile = profile.clone();
        }
        if self.no_migrate {
            config.apply_migrations = false;
        }
        Ok(config)
    }

    /// Resolve config, start logging and open the database
    pub fn open(&self) -> Result<(RestoreConfig, rusqlite::Connection), Box<dyn std::error::Error>> {
        let config = self.resolve()?;
        init(config.profile());
        if let Some(parent) = config.database.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = qmatrix_store::db::open_configured(&config.database, config.apply_migrations)?;
        Ok((config, conn))
    }
}
