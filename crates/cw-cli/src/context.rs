//! Runtime context for CLI commands

use anyhow::{Context, Result};
use cw_core::Config;
use cw_db::{Database, Engine};
use cw_migrate::MigrationOptions;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Loaded configuration plus the engine it points at
pub struct CommandContext {
    pub config: Config,
    pub engine: Engine,
}

impl CommandContext {
    /// Resolve configuration: `--config` file, else `./cowrie-db.yml` when
    /// present, else defaults. `COWRIE_DB_URL` then `--db-url` override the
    /// URL.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let mut config = match &global.config {
            Some(path) => Config::load(Path::new(path))
                .with_context(|| format!("Failed to load configuration file {path}"))?,
            None if has_local_config() => {
                Config::load_from_dir(Path::new(".")).context("Failed to load cowrie-db.yml")?
            }
            None => Config::from_env().context("Invalid configuration")?,
        };
        if let Some(url) = &global.db_url {
            config = config
                .with_database_url(url.clone())
                .context("Invalid --db-url")?;
        }

        let engine = Engine::from_config(&config.database).context("Unsupported database URL")?;
        log::debug!("Using database {}", engine.display_url());
        Ok(Self { config, engine })
    }

    /// Open a connection to the configured database
    pub fn connect(&self) -> Result<Box<dyn Database>> {
        self.engine
            .connect()
            .with_context(|| format!("Failed to connect to {}", self.engine.display_url()))
    }

    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions::from(&self.config.migrations)
    }
}

fn has_local_config() -> bool {
    ["cowrie-db.yml", "cowrie-db.yaml"]
        .iter()
        .any(|name| Path::new(name).exists())
}
