//! Versioned migration runner.
//!
//! One run is one transaction: base tables are created, the ledger is read,
//! and every registered version above it is applied in order, each followed
//! by a ledger write. Any error rolls back the whole run.

use crate::context::{MigrationContext, StepKind};
use crate::ddl::base_tables;
use crate::error::{MigrateError, MigrateResult};
use crate::features::detect_features;
use crate::ledger::{get_version, set_version};
use crate::versions;
use cw_core::MigrationConfig;
use cw_db::{with_transaction, Database};
use serde::Serialize;

/// Version the registry ends at.
pub const CURRENT_SCHEMA_VERSION: i32 = 16;

/// A version's upgrade or downgrade body.
pub type MigrationFn = fn(&mut MigrationContext<'_>) -> MigrateResult<()>;

/// One registered schema version.
pub struct Migration {
    /// Version this migration produces
    pub version: i32,
    /// Short human-readable summary
    pub description: &'static str,
    /// Upgrade from `version - 1`
    pub up: MigrationFn,
    /// Downgrade back to `version - 1`, if supported
    pub down: Option<MigrationFn>,
}

/// All versions, ascending and contiguous from 1.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "core tables and indexes",
        up: versions::v001_core::up,
        down: None,
    },
    Migration {
        version: 2,
        description: "raw event source generation and uniqueness",
        up: versions::v002_source_generation::up,
        down: None,
    },
    Migration {
        version: 3,
        description: "session enrichment document",
        up: versions::v003_session_enrichment::up,
        down: None,
    },
    Migration {
        version: 4,
        description: "downloaded files",
        up: versions::v004_files::up,
        down: None,
    },
    Migration {
        version: 5,
        description: "derived raw event columns",
        up: versions::v005_derived_columns::up,
        down: None,
    },
    Migration {
        version: 6,
        description: "JSONB conversion",
        up: versions::v006_jsonb::up,
        down: None,
    },
    Migration {
        version: 7,
        description: "dead letter queue hardening",
        up: versions::v007_dlq_hardening::up,
        down: None,
    },
    Migration {
        version: 8,
        description: "snowshoe detections",
        up: versions::v008_snowshoe::up,
        down: None,
    },
    Migration {
        version: 9,
        description: "longtail analysis and vector tables",
        up: versions::v009_longtail::up,
        down: Some(versions::v009_longtail::down),
    },
    Migration {
        version: 10,
        description: "password tracking",
        up: versions::v010_password_tracking::up,
        down: None,
    },
    Migration {
        version: 11,
        description: "SSH key intelligence",
        up: versions::v011_ssh_keys::up,
        down: None,
    },
    Migration {
        version: 12,
        description: "longtail detection sessions",
        up: versions::v012_longtail_sessions::up,
        down: None,
    },
    Migration {
        version: 13,
        description: "ASN and IP inventory",
        up: versions::v013_inventory::up,
        down: None,
    },
    Migration {
        version: 14,
        description: "session enrichment snapshots",
        up: versions::v014_session_snapshots::up,
        down: None,
    },
    Migration {
        version: 15,
        description: "IP to ASN history",
        up: versions::v015_ip_asn_history::up,
        down: None,
    },
    Migration {
        version: 16,
        description: "IP inventory classification columns",
        up: versions::v016_ip_classification::up,
        down: None,
    },
];

/// Tunables passed to version functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    /// IVFFlat `lists` for the behavioral vector index
    pub ivfflat_lists: u32,
    pub command_vector_dimensions: u32,
    pub behavioral_vector_dimensions: u32,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self::from(&MigrationConfig::default())
    }
}

impl From<&MigrationConfig> for MigrationOptions {
    fn from(config: &MigrationConfig) -> Self {
        Self {
            ivfflat_lists: config.ivfflat_lists,
            command_vector_dimensions: config.command_vector_dimensions,
            behavioral_vector_dimensions: config.behavioral_vector_dimensions,
        }
    }
}

/// Summary of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Ledger version before the run
    pub from_version: i32,
    /// Ledger version after the run
    pub to_version: i32,
    /// Tables, columns, indexes, constraints, views and triggers created
    pub structural_changes: u32,
    /// Best-effort statements that failed and were skipped
    pub advisory_failures: u32,
}

impl MigrationOutcome {
    /// Versions applied by this run
    pub fn applied(&self) -> i32 {
        (self.to_version - self.from_version).max(0)
    }
}

/// Ledger position relative to the registry, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub current_version: i32,
    pub target_version: i32,
    /// Registered versions above `current_version`
    pub pending: Vec<i32>,
}

impl SchemaStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Objects that exist only on PostgreSQL deployments.
///
/// SQLite advances the ledger through the owning versions without creating
/// them, so the same schema version does not mean the same set of objects
/// on both engines. Vector tables additionally need the `vector` extension.
pub struct PostgresOnlyArtifacts;

impl PostgresOnlyArtifacts {
    /// Tables created only on PostgreSQL
    pub const TABLES: &'static [&'static str] = &[
        "dlq_processing_metrics",
        "dlq_circuit_breaker_state",
        "command_sequence_vectors",
        "behavioral_vectors",
    ];

    /// Views created only on PostgreSQL
    pub const VIEWS: &'static [&'static str] = &["dlq_health"];

    /// Indexes created only on PostgreSQL
    pub const INDEXES: &'static [&'static str] = &[
        versions::v006_jsonb::ENRICHMENT_GIN_INDEX,
        versions::v009_longtail::COMMAND_VECTOR_INDEX,
        versions::v009_longtail::BEHAVIORAL_VECTOR_INDEX,
    ];

    /// `dead_letter_events` columns added only on PostgreSQL
    pub fn dead_letter_columns() -> impl Iterator<Item = &'static str> {
        versions::v007_dlq_hardening::DLQ_COLUMN_NAMES.iter().copied()
    }
}

/// Bring the schema to [`CURRENT_SCHEMA_VERSION`] with default options,
/// returning the version reached.
pub fn apply_migrations(db: &mut dyn Database) -> MigrateResult<i32> {
    Ok(apply_migrations_with(db, &MigrationOptions::default())?.to_version)
}

/// Bring the schema to [`CURRENT_SCHEMA_VERSION`].
pub fn apply_migrations_with(
    db: &mut dyn Database,
    options: &MigrationOptions,
) -> MigrateResult<MigrationOutcome> {
    migrate_to(db, CURRENT_SCHEMA_VERSION, options)
}

/// Apply registered versions up to and including `target`.
///
/// A database already past `target` is left untouched; use
/// [`rollback_to`] to move backward.
pub fn migrate_to(
    db: &mut dyn Database,
    target: i32,
    options: &MigrationOptions,
) -> MigrateResult<MigrationOutcome> {
    check_version(target)?;

    let outcome = with_transaction(db, |db| {
        let features = detect_features(db);
        let mut ctx = MigrationContext::new(db, options.clone(), features);

        create_base_tables(&mut ctx)?;

        let from_version = get_version(ctx.db());
        let mut version = from_version;
        if from_version > CURRENT_SCHEMA_VERSION {
            log::warn!(
                "Database schema v{from_version} is newer than this build (v{CURRENT_SCHEMA_VERSION})"
            );
        } else if from_version >= target {
            log::info!("Schema at v{from_version}, nothing to apply for target v{target}");
        }

        for migration in MIGRATIONS
            .iter()
            .filter(|m| m.version > from_version && m.version <= target)
        {
            log::info!(
                "Applying schema v{} ({})",
                migration.version,
                migration.description
            );
            (migration.up)(&mut ctx)?;
            set_version(ctx.db(), migration.version)?;
            version = migration.version;
        }

        Ok::<_, MigrateError>(MigrationOutcome {
            from_version,
            to_version: version,
            structural_changes: ctx.structural_changes(),
            advisory_failures: ctx.advisory_failures(),
        })
    })?;

    if outcome.advisory_failures > 0 {
        log::warn!(
            "Migration finished with {} skipped best-effort step(s)",
            outcome.advisory_failures
        );
    }
    log::info!(
        "Schema migrated v{} -> v{} ({} structural change(s))",
        outcome.from_version,
        outcome.to_version,
        outcome.structural_changes
    );
    Ok(outcome)
}

/// Undo versions above `target`, newest first, in one transaction.
///
/// Fails with [`MigrateError::IrreversibleMigration`] before touching
/// anything if a version in the range has no downgrade.
pub fn rollback_to(db: &mut dyn Database, target: i32) -> MigrateResult<MigrationOutcome> {
    check_version(target)?;

    with_transaction(db, |db| {
        let from_version = get_version(db);
        if target >= from_version {
            log::info!("Schema at v{from_version}, nothing to roll back to v{target}");
            return Ok(MigrationOutcome {
                from_version,
                to_version: from_version,
                structural_changes: 0,
                advisory_failures: 0,
            });
        }

        let steps: Vec<&Migration> = MIGRATIONS
            .iter()
            .rev()
            .filter(|m| m.version > target && m.version <= from_version)
            .collect();
        if let Some(blocked) = steps.iter().find(|m| m.down.is_none()) {
            return Err(MigrateError::IrreversibleMigration {
                version: blocked.version,
            });
        }

        let features = detect_features(db);
        let mut ctx = MigrationContext::new(db, MigrationOptions::default(), features);
        for migration in steps {
            if let Some(down) = migration.down {
                log::info!("Rolling back schema v{}", migration.version);
                down(&mut ctx)?;
                set_version(ctx.db(), migration.version - 1)?;
            }
        }

        Ok(MigrationOutcome {
            from_version,
            to_version: target,
            structural_changes: ctx.structural_changes(),
            advisory_failures: ctx.advisory_failures(),
        })
    })
}

/// Read the ledger and list pending versions. Creates nothing.
pub fn schema_status(db: &mut dyn Database) -> SchemaStatus {
    let current_version = get_version(db);
    SchemaStatus {
        current_version,
        target_version: CURRENT_SCHEMA_VERSION,
        pending: MIGRATIONS
            .iter()
            .map(|m| m.version)
            .filter(|v| *v > current_version)
            .collect(),
    }
}

fn check_version(version: i32) -> MigrateResult<()> {
    if (0..=CURRENT_SCHEMA_VERSION).contains(&version) {
        Ok(())
    } else {
        Err(MigrateError::UnknownVersion {
            version,
            latest: CURRENT_SCHEMA_VERSION,
        })
    }
}

fn create_base_tables(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    for table in base_tables(ctx.db_type()) {
        ctx.ensure_table(StepKind::Required, table.name, &table.create_sql)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
