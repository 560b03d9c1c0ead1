//! Error types for the migration engine.

use cw_db::DbError;
use cw_sql::SqlError;
use thiserror::Error;

/// Migration errors.
///
/// Only structural failures surface here. Best-effort steps that fail are
/// logged and counted on the [`crate::MigrationOutcome`] instead.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A statement marked as required did not succeed (G001).
    #[error("[G001] Required migration step failed: {description}")]
    RequiredStep { description: String },

    /// Requested version is outside the registry (G002).
    #[error("[G002] Unknown schema version {version} (latest is {latest})")]
    UnknownVersion { version: i32, latest: i32 },

    /// Rollback crosses a version without a downgrade (G003).
    #[error("[G003] Schema version {version} cannot be rolled back")]
    IrreversibleMigration { version: i32 },

    /// Operation is not available on this engine (G004).
    #[error("[G004] {operation} requires PostgreSQL, connection is {dialect}")]
    UnsupportedDialect { operation: String, dialect: String },

    /// An object the operation depends on does not exist (G005).
    #[error("[G005] Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    /// Database driver error (G006).
    #[error("[G006] Database error: {0}")]
    Database(#[from] DbError),

    /// Invalid SQL expression request (G007).
    #[error("[G007] SQL generation failed: {0}")]
    Sql(#[from] SqlError),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
