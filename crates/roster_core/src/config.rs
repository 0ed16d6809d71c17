//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! [database]
//! path = "/var/lib/roster/roster.sqlite3"
//!
//! [log]
//! level = "info"
//! dir = "/var/log/roster"
//!
//! [artifacts]
//! dir = "/var/lib/roster/exports"
//! retention_months = 3
//! ```

use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_RETENTION_MONTHS: u32 = 3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("cannot create directory `{}`: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level roster configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub database: DatabaseConfig,
    pub log: LogConfig,
    pub artifacts: ArtifactConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("roster.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Directory for rotating log files; must be absolute when logging is used.
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Where rendered exports are written.
    pub dir: PathBuf,
    /// Exports whose range ended longer ago than this are swept.
    pub retention_months: u32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            retention_months: DEFAULT_RETENTION_MONTHS,
        }
    }
}

impl RosterConfig {
    /// Loads and validates a TOML file; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }
        if self.artifacts.dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("artifacts.dir must not be empty".into()));
        }
        if self.artifacts.retention_months == 0 {
            return Err(ConfigError::Invalid(
                "artifacts.retention_months must be at least 1".into(),
            ));
        }
        normalize_level(&self.log.level).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }

    /// Creates the database parent, log and artifact directories when missing.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let database_dir = self
            .database
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        for dir in database_dir
            .into_iter()
            .chain([self.log.dir.as_path(), self.artifacts.dir.as_path()])
        {
            fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}
