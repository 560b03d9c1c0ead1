//! cw-migrate - Versioned schema migration engine for cowrie-db
//!
//! Walks a database from whatever version its `schema_state` ledger reports
//! up to [`CURRENT_SCHEMA_VERSION`], one version at a time, inside a single
//! transaction. Every version is an idempotent sequence of existence checks
//! and guarded DDL, so a run can be repeated or resumed after a crash.
//!
//! SQLite and PostgreSQL deployments reach the same version number but not
//! the same set of objects; see [`PostgresOnlyArtifacts`].

pub mod context;
pub mod ddl;
pub mod dlq;
pub mod error;
pub mod features;
pub mod guarded;
pub mod introspect;
pub mod ledger;
pub mod migration;
pub mod procedures;
pub mod versions;

pub use context::MigrationContext;
pub use error::{MigrateError, MigrateResult};
pub use features::{detect_features, extension_present, FeatureReport};
pub use guarded::{execute_guarded, StepKind};
pub use introspect::{column_exists, is_generated_column, table_exists};
pub use ledger::{get_version, set_version};
pub use migration::{
    apply_migrations, apply_migrations_with, migrate_to, rollback_to, schema_status, Migration,
    MigrationOptions, MigrationOutcome, PostgresOnlyArtifacts, SchemaStatus,
    CURRENT_SCHEMA_VERSION, MIGRATIONS,
};
