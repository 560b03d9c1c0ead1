//! Dialect capability detection.

use crate::guarded::probe;
use cw_core::config::MAX_VECTOR_DIMENSIONS;
use cw_db::{Database, DatabaseType, SqlValue};
use serde::Serialize;

/// Placeholder for optional values that could not be read.
pub const UNKNOWN: &str = "Unknown";

/// Extension providing the `vector` column type.
pub const VECTOR_EXTENSION: &str = "vector";

/// Extension providing `digest()` for checksum backfills.
pub const CRYPTO_EXTENSION: &str = "pgcrypto";

/// What the connected engine can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureReport {
    pub database_type: DatabaseType,
    /// Engine version string, or [`UNKNOWN`]
    pub version: String,
    pub vector_extension_present: bool,
    /// Installed `vector` extension version; [`UNKNOWN`] if present but
    /// unreadable
    pub vector_extension_version: Option<String>,
    /// True on PostgreSQL
    pub advanced_dlq_supported: bool,
    /// True when the vector extension is present
    pub vector_analysis_enabled: bool,
    /// Largest embedding dimension, 0 without vector support
    pub max_vector_dimensions: u32,
}

/// Inspect the connection. Never fails; unreadable optional fields fall
/// back to [`UNKNOWN`].
pub fn detect_features(db: &mut dyn Database) -> FeatureReport {
    let database_type = db.db_type();
    let version = engine_version(db).unwrap_or_else(|| UNKNOWN.to_string());
    let vector_extension_present = extension_present(db);
    let vector_extension_version = if vector_extension_present {
        Some(extension_version(db, VECTOR_EXTENSION).unwrap_or_else(|| UNKNOWN.to_string()))
    } else {
        None
    };

    let report = FeatureReport {
        database_type,
        version,
        vector_extension_present,
        vector_extension_version,
        advanced_dlq_supported: database_type.is_postgres(),
        vector_analysis_enabled: vector_extension_present,
        max_vector_dimensions: if vector_extension_present {
            MAX_VECTOR_DIMENSIONS
        } else {
            0
        },
    };
    log::debug!("Detected database features: {report:?}");
    report
}

/// Whether the vector-similarity extension is installed.
///
/// `false` on SQLite without issuing a query.
pub fn extension_present(db: &mut dyn Database) -> bool {
    extension_installed(db, VECTOR_EXTENSION)
}

/// Whether the PostgreSQL extension `name` is installed in this database.
pub fn extension_installed(db: &mut dyn Database, name: &str) -> bool {
    if !db.db_type().is_postgres() {
        return false;
    }
    match probe(db, |db| {
        db.query_opt(
            "SELECT 1 FROM pg_extension WHERE extname = $1::text",
            &[SqlValue::from(name)],
        )
    }) {
        Ok(row) => row.is_some(),
        Err(e) => {
            log::debug!("Extension probe for {name} failed: {e}");
            false
        }
    }
}

fn engine_version(db: &mut dyn Database) -> Option<String> {
    let sql = match db.db_type() {
        DatabaseType::Sqlite => "SELECT sqlite_version()",
        DatabaseType::Postgresql => "SELECT version()",
    };
    probe(db, |db| db.query_scalar(sql, &[]))
        .map_err(|e| log::debug!("Engine version probe failed: {e}"))
        .ok()
        .and_then(|v| v.as_text())
}

fn extension_version(db: &mut dyn Database, name: &str) -> Option<String> {
    probe(db, |db| {
        db.query_scalar(
            "SELECT extversion::text FROM pg_extension WHERE extname = $1::text",
            &[SqlValue::from(name)],
        )
    })
    .ok()
    .and_then(|v| v.as_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_db::SqliteBackend;

    #[test]
    fn sqlite_report() {
        let mut db = SqliteBackend::in_memory().unwrap();
        let report = detect_features(&mut db);
        assert_eq!(report.database_type, DatabaseType::Sqlite);
        assert!(report.version.starts_with('3'), "{}", report.version);
        assert!(!report.vector_extension_present);
        assert_eq!(report.vector_extension_version, None);
        assert!(!report.advanced_dlq_supported);
        assert!(!report.vector_analysis_enabled);
        assert_eq!(report.max_vector_dimensions, 0);
    }

    #[test]
    fn extension_checks_short_circuit_on_sqlite() {
        let mut db = SqliteBackend::in_memory().unwrap();
        assert!(!extension_present(&mut db));
        assert!(!extension_installed(&mut db, CRYPTO_EXTENSION));
    }

    #[test]
    fn report_serializes_engine_name() {
        let mut db = SqliteBackend::in_memory().unwrap();
        let json = serde_json::to_value(detect_features(&mut db)).unwrap();
        assert_eq!(json["database_type"], "sqlite");
        assert_eq!(json["max_vector_dimensions"], 0);
    }
}
