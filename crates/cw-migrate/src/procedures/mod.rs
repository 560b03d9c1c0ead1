//! PL/pgSQL dead letter queue bundles.
//!
//! Two generations of stored routines repair and re-insert dead-lettered
//! events inside PostgreSQL. Each bundle is a script of
//! `CREATE OR REPLACE FUNCTION` statements embedded via `include_str!`, so
//! installing is idempotent. The typed wrappers below call the routines and
//! unpack their result tuples by position.

use crate::error::{MigrateError, MigrateResult};
use crate::introspect::{column_exists, function_exists, table_exists};
use cw_db::{with_transaction, Database, Row, SqlValue};
use serde::Serialize;

/// Basic bundle: JSON repair, upsert, processing, cleanup, statistics.
pub const BASIC_SQL: &str = include_str!("basic.sql");

/// Enhanced bundle: circuit breaker, processing locks, metrics.
pub const ENHANCED_SQL: &str = include_str!("enhanced.sql");

/// Routines created by [`BASIC_SQL`].
pub const BASIC_FUNCTIONS: &[&str] = &[
    "repair_cowrie_json",
    "upsert_repaired_event",
    "process_dlq_events",
    "cleanup_resolved_dlq_events",
    "get_dlq_statistics",
];

/// Routines created by [`ENHANCED_SQL`].
pub const ENHANCED_FUNCTIONS: &[&str] = &[
    "repair_cowrie_json_enhanced",
    "check_circuit_breaker",
    "record_circuit_breaker_result",
    "process_dlq_events_enhanced",
    "cleanup_resolved_dlq_events_enhanced",
    "get_dlq_health_stats",
];

/// Which bundles are present in the connected database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BundleStatus {
    pub basic: bool,
    pub enhanced: bool,
}

/// `process_dlq_events` result tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DlqProcessingResult {
    pub processed: i64,
    pub repaired: i64,
    pub failed: i64,
    pub skipped: i64,
}

/// `process_dlq_events_enhanced` result tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnhancedProcessingResult {
    pub processed: i64,
    pub repaired: i64,
    pub failed: i64,
    pub skipped: i64,
    pub circuit_breaker_triggered: bool,
    pub duration_ms: i64,
}

/// `get_dlq_statistics` result tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DlqStatistics {
    pub total_events: i64,
    pub unresolved_events: i64,
    pub resolved_events: i64,
    /// Up to ten unresolved reasons with their counts
    pub top_reasons: serde_json::Value,
    pub oldest_unresolved: Option<String>,
    pub newest_unresolved: Option<String>,
}

/// `get_dlq_health_stats` result tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DlqHealthStats {
    pub pending_events: i64,
    pub processed_events: i64,
    pub locked_events: i64,
    pub high_retry_events: i64,
    pub high_priority_events: i64,
    pub avg_resolution_time_seconds: Option<f64>,
    pub oldest_unresolved_event: Option<String>,
    pub circuit_breaker_state: String,
}

/// `cleanup_resolved_dlq_events_enhanced` result tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    pub deleted: i64,
    pub expired_locks_released: i64,
}

/// Install the basic bundle.
pub fn install_basic(db: &mut dyn Database) -> MigrateResult<()> {
    require_postgres(db, "install basic DLQ procedures")?;
    require_hardened_dlq(db)?;
    with_transaction(db, |db| {
        db.execute_batch(BASIC_SQL)?;
        Ok::<_, MigrateError>(())
    })?;
    log::info!("Installed basic DLQ procedures ({} functions)", BASIC_FUNCTIONS.len());
    Ok(())
}

/// Install the enhanced bundle together with the basic routines it calls.
pub fn install_enhanced(db: &mut dyn Database) -> MigrateResult<()> {
    require_postgres(db, "install enhanced DLQ procedures")?;
    require_hardened_dlq(db)?;
    for table in ["dlq_processing_metrics", "dlq_circuit_breaker_state"] {
        if !table_exists(db, table) {
            return Err(MigrateError::MissingPrerequisite(format!(
                "table {table} does not exist; migrate to schema v7 first"
            )));
        }
    }
    with_transaction(db, |db| {
        db.execute_batch(BASIC_SQL)?;
        db.execute_batch(ENHANCED_SQL)?;
        Ok::<_, MigrateError>(())
    })?;
    log::info!(
        "Installed enhanced DLQ procedures ({} functions)",
        BASIC_FUNCTIONS.len() + ENHANCED_FUNCTIONS.len()
    );
    Ok(())
}

/// Report installed bundles. Always both `false` on SQLite.
pub fn bundle_status(db: &mut dyn Database) -> BundleStatus {
    BundleStatus {
        basic: all_functions_present(db, BASIC_FUNCTIONS),
        enhanced: all_functions_present(db, ENHANCED_FUNCTIONS),
    }
}

fn all_functions_present(db: &mut dyn Database, names: &[&str]) -> bool {
    for name in names {
        if !function_exists(db, name) {
            return false;
        }
    }
    true
}

pub fn process_dlq_events(
    db: &mut dyn Database,
    limit: i32,
    reason_filter: Option<&str>,
) -> MigrateResult<DlqProcessingResult> {
    let row = call(
        db,
        "process_dlq_events",
        "SELECT processed_count, repaired_count, failed_count, skipped_count \
         FROM process_dlq_events($1::integer, $2::text)",
        &[SqlValue::from(limit), SqlValue::from(reason_filter)],
    )?;
    Ok(DlqProcessingResult {
        processed: row.get_i64(0)?,
        repaired: row.get_i64(1)?,
        failed: row.get_i64(2)?,
        skipped: row.get_i64(3)?,
    })
}

pub fn process_dlq_events_enhanced(
    db: &mut dyn Database,
    batch_size: i32,
    processor_id: Option<&str>,
    max_retries: i32,
) -> MigrateResult<EnhancedProcessingResult> {
    let row = call(
        db,
        "process_dlq_events_enhanced",
        "SELECT processed_count, repaired_count, failed_count, skipped_count, \
         circuit_breaker_triggered, processing_duration_ms \
         FROM process_dlq_events_enhanced($1::integer, $2::text, $3::integer)",
        &[
            SqlValue::from(batch_size),
            SqlValue::from(processor_id),
            SqlValue::from(max_retries),
        ],
    )?;
    Ok(EnhancedProcessingResult {
        processed: row.get_i64(0)?,
        repaired: row.get_i64(1)?,
        failed: row.get_i64(2)?,
        skipped: row.get_i64(3)?,
        circuit_breaker_triggered: row.get_bool(4)?,
        duration_ms: row.get_i64(5)?,
    })
}

pub fn get_dlq_statistics(db: &mut dyn Database) -> MigrateResult<DlqStatistics> {
    let row = call(
        db,
        "get_dlq_statistics",
        "SELECT total_events, unresolved_events, resolved_events, top_reasons, \
         oldest_unresolved, newest_unresolved FROM get_dlq_statistics()",
        &[],
    )?;
    Ok(DlqStatistics {
        total_events: row.get_i64(0)?,
        unresolved_events: row.get_i64(1)?,
        resolved_events: row.get_i64(2)?,
        top_reasons: json_cell(&row, 3)?.unwrap_or_else(|| serde_json::json!({})),
        oldest_unresolved: row.get_opt_string(4)?,
        newest_unresolved: row.get_opt_string(5)?,
    })
}

pub fn get_dlq_health_stats(db: &mut dyn Database) -> MigrateResult<DlqHealthStats> {
    let row = call(
        db,
        "get_dlq_health_stats",
        "SELECT pending_events, processed_events, locked_events, high_retry_events, \
         high_priority_events, avg_resolution_time_seconds, oldest_unresolved_event, \
         circuit_breaker_state FROM get_dlq_health_stats()",
        &[],
    )?;
    Ok(DlqHealthStats {
        pending_events: row.get_i64(0)?,
        processed_events: row.get_i64(1)?,
        locked_events: row.get_i64(2)?,
        high_retry_events: row.get_i64(3)?,
        high_priority_events: row.get_i64(4)?,
        avg_resolution_time_seconds: row.get(5)?.as_f64(),
        oldest_unresolved_event: row.get_opt_string(6)?,
        circuit_breaker_state: row.get_string(7)?,
    })
}

/// Delete resolved events older than `older_than_days`; returns the count.
pub fn cleanup_resolved_dlq_events(db: &mut dyn Database, older_than_days: i32) -> MigrateResult<i64> {
    let row = call(
        db,
        "cleanup_resolved_dlq_events",
        "SELECT cleanup_resolved_dlq_events($1::integer)",
        &[SqlValue::from(older_than_days)],
    )?;
    Ok(row.get_i64(0)?)
}

pub fn cleanup_resolved_dlq_events_enhanced(
    db: &mut dyn Database,
    older_than_days: i32,
    batch_size: i32,
) -> MigrateResult<CleanupResult> {
    let row = call(
        db,
        "cleanup_resolved_dlq_events_enhanced",
        "SELECT deleted_count, expired_locks_released \
         FROM cleanup_resolved_dlq_events_enhanced($1::integer, $2::integer)",
        &[SqlValue::from(older_than_days), SqlValue::from(batch_size)],
    )?;
    Ok(CleanupResult {
        deleted: row.get_i64(0)?,
        expired_locks_released: row.get_i64(1)?,
    })
}

/// Run the basic JSON repair; `None` when the text is beyond repair.
pub fn repair_cowrie_json(db: &mut dyn Database, text: &str) -> MigrateResult<Option<serde_json::Value>> {
    repair_with(db, "repair_cowrie_json", text)
}

/// Run the enhanced JSON repair (`True`/`None` literals, quoting fixes).
pub fn repair_cowrie_json_enhanced(
    db: &mut dyn Database,
    text: &str,
) -> MigrateResult<Option<serde_json::Value>> {
    repair_with(db, "repair_cowrie_json_enhanced", text)
}

fn repair_with(db: &mut dyn Database, function: &str, text: &str) -> MigrateResult<Option<serde_json::Value>> {
    let row = call(
        db,
        function,
        &format!("SELECT {function}($1::text)"),
        &[SqlValue::from(text)],
    )?;
    json_cell(&row, 0)
}

fn call(db: &mut dyn Database, function: &str, sql: &str, params: &[SqlValue]) -> MigrateResult<Row> {
    require_postgres(db, function)?;
    log::debug!("Calling {function}");
    Ok(db
        .query_opt(sql, params)?
        .ok_or_else(|| cw_db::DbError::NoRows(function.to_string()))?)
}

fn json_cell(row: &Row, idx: usize) -> MigrateResult<Option<serde_json::Value>> {
    match row.get_opt_string(idx)? {
        Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
            cw_db::DbError::ConversionError(format!("column {idx} is not JSON: {e}")).into()
        }),
        None => Ok(None),
    }
}

fn require_postgres(db: &dyn Database, operation: &str) -> MigrateResult<()> {
    if db.db_type().is_postgres() {
        Ok(())
    } else {
        Err(MigrateError::UnsupportedDialect {
            operation: operation.to_string(),
            dialect: db.db_type().to_string(),
        })
    }
}

fn require_hardened_dlq(db: &mut dyn Database) -> MigrateResult<()> {
    if column_exists(db, "dead_letter_events", "retry_count") {
        Ok(())
    } else {
        Err(MigrateError::MissingPrerequisite(
            "dead_letter_events lacks the v7 processing columns; migrate to schema v7 first"
                .to_string(),
        ))
    }
}
