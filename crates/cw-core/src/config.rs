//! Configuration types and parsing for cowrie-db.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that overrides `database.url`.
pub const DB_URL_ENV: &str = "COWRIE_DB_URL";

/// Largest vector dimension the schema will declare (pgvector index limit).
pub const MAX_VECTOR_DIMENSIONS: u32 = 2000;

/// URL prefixes accepted for `database.url`.
const SUPPORTED_URL_PREFIXES: &[&str] = &["sqlite:", "postgresql://", "postgresql+", "postgres://"];

/// Main configuration from cowrie-db.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Tunables consumed by the migration runner
    #[serde(default)]
    pub migrations: MigrationConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite:///path/to.db`, `sqlite://:memory:`,
    /// `postgresql://user@host/db`)
    #[serde(default = "default_db_url")]
    pub url: String,

    /// SQLite connection pragmas
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            sqlite: SqliteConfig::default(),
        }
    }
}

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqliteJournalMode {
    /// Write-ahead logging (default)
    #[default]
    Wal,
    /// Rollback journal, deleted at commit
    Delete,
    /// In-memory journal
    Memory,
}

impl std::fmt::Display for SqliteJournalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqliteJournalMode::Wal => write!(f, "WAL"),
            SqliteJournalMode::Delete => write!(f, "DELETE"),
            SqliteJournalMode::Memory => write!(f, "MEMORY"),
        }
    }
}

/// SQLite-specific connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Journal mode applied on open (ignored for in-memory databases)
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,

    /// Busy timeout in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Enforce foreign keys (`PRAGMA foreign_keys = ON`)
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: SqliteJournalMode::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
            foreign_keys: true,
        }
    }
}

/// Migration tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// IVFFlat `lists` parameter for the behavioral vector index
    #[serde(default = "default_ivfflat_lists")]
    pub ivfflat_lists: u32,

    /// Dimension of `command_sequence_vectors.sequence_vector`
    #[serde(default = "default_command_vector_dimensions")]
    pub command_vector_dimensions: u32,

    /// Dimension of `behavioral_vectors.behavioral_vector`
    #[serde(default = "default_behavioral_vector_dimensions")]
    pub behavioral_vector_dimensions: u32,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            ivfflat_lists: default_ivfflat_lists(),
            command_vector_dimensions: default_command_vector_dimensions(),
            behavioral_vector_dimensions: default_behavioral_vector_dimensions(),
        }
    }
}

fn default_db_url() -> String {
    "sqlite:///cowrie.sqlite".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_ivfflat_lists() -> u32 {
    100
}

fn default_command_vector_dimensions() -> u32 {
    128
}

fn default_behavioral_vector_dimensions() -> u32 {
    64
}

impl Config {
    /// Load configuration from a file path
    ///
    /// Applies environment overrides and validates the result.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory
    /// Looks for cowrie-db.yml or cowrie-db.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("cowrie-db.yml");
        let yaml_path = dir.join("cowrie-db.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: dir.join("cowrie-db.yml").display().to_string(),
            })
        }
    }

    /// Build a configuration from defaults plus environment overrides.
    pub fn from_env() -> CoreResult<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Replace `database.url` with `COWRIE_DB_URL` when it is set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DB_URL_ENV) {
            if !url.trim().is_empty() {
                log::debug!("database.url overridden by {DB_URL_ENV}");
                self.database.url = url;
            }
        }
    }

    /// Replace `database.url` with an explicit value (e.g. a CLI flag).
    pub fn with_database_url(mut self, url: impl Into<String>) -> CoreResult<Self> {
        self.database.url = url.into();
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let url = self.database.url.trim();
        if url.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.url cannot be empty".to_string(),
            });
        }
        if url != ":memory:" && !SUPPORTED_URL_PREFIXES.iter().any(|p| url.starts_with(p)) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "Unsupported database.url '{}'. Expected one of: {}",
                    url,
                    SUPPORTED_URL_PREFIXES.join(", ")
                ),
            });
        }

        let m = &self.migrations;
        if m.ivfflat_lists == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.ivfflat_lists must be at least 1".to_string(),
            });
        }
        for (name, dims) in [
            ("command_vector_dimensions", m.command_vector_dimensions),
            ("behavioral_vector_dimensions", m.behavioral_vector_dimensions),
        ] {
            if dims == 0 || dims > MAX_VECTOR_DIMENSIONS {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "migrations.{name} must be between 1 and {MAX_VECTOR_DIMENSIONS}, got {dims}"
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
