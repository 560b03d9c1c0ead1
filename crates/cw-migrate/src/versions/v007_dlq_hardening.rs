//! v7: dead letter queue hardening (PostgreSQL only).
//!
//! Adds locking, retry and idempotency bookkeeping to `dead_letter_events`,
//! plus the metrics and circuit-breaker tables the enhanced processing
//! functions write to. Every sub-step is independently idempotent and
//! best-effort.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::dlq::{IDEMPOTENCY_KEY_SQL, PAYLOAD_CHECKSUM_SQL};
use crate::error::MigrateResult;
use crate::features::{extension_installed, CRYPTO_EXTENSION};
use crate::introspect::function_exists;
use cw_sql::ColumnTypes;

/// Columns added to `dead_letter_events`.
pub const DLQ_COLUMN_NAMES: &[&str] = &[
    "payload_checksum",
    "retry_count",
    "error_history",
    "processing_attempts",
    "resolution_method",
    "idempotency_key",
    "processing_lock",
    "lock_expires_at",
    "priority",
    "classification",
    "updated_at",
    "last_processed_at",
];

/// `(name, definition)` for each of [`DLQ_COLUMN_NAMES`].
fn dlq_columns(t: &ColumnTypes) -> Vec<(&'static str, String)> {
    let empty_array = format!("{} NOT NULL DEFAULT {}", t.json, t.empty_json_array);
    let now = format!("{} NOT NULL DEFAULT NOW()", t.timestamp);
    vec![
        ("payload_checksum", "VARCHAR(64)".to_string()),
        ("retry_count", "INTEGER NOT NULL DEFAULT 0".to_string()),
        ("error_history", empty_array.clone()),
        ("processing_attempts", empty_array),
        ("resolution_method", "VARCHAR(32)".to_string()),
        ("idempotency_key", "VARCHAR(64)".to_string()),
        ("processing_lock", "UUID".to_string()),
        ("lock_expires_at", t.timestamp.to_string()),
        ("priority", "INTEGER NOT NULL DEFAULT 5".to_string()),
        ("classification", "VARCHAR(32)".to_string()),
        ("updated_at", now),
        ("last_processed_at", t.timestamp.to_string()),
    ]
}

/// `(name, create statement)`
const DLQ_INDEXES: &[(&str, &str)] = &[
    (
        "ix_dead_letter_events_payload_checksum",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_payload_checksum \
         ON dead_letter_events (payload_checksum)",
    ),
    (
        "ix_dead_letter_events_retry_count",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_retry_count \
         ON dead_letter_events (retry_count)",
    ),
    (
        "ix_dead_letter_events_processing_lock",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_processing_lock \
         ON dead_letter_events (processing_lock) WHERE processing_lock IS NOT NULL",
    ),
    (
        "ix_dead_letter_events_lock_expires",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_lock_expires \
         ON dead_letter_events (lock_expires_at)",
    ),
    (
        "ix_dead_letter_events_priority",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_priority \
         ON dead_letter_events (priority, created_at)",
    ),
    (
        "ix_dead_letter_events_classification",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_classification \
         ON dead_letter_events (classification)",
    ),
    (
        "ix_dead_letter_events_unresolved_queue",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_unresolved_queue \
         ON dead_letter_events (priority, created_at) WHERE resolved = FALSE",
    ),
    (
        "ix_dead_letter_events_last_processed",
        "CREATE INDEX IF NOT EXISTS ix_dead_letter_events_last_processed \
         ON dead_letter_events (last_processed_at)",
    ),
];

const METRICS_TABLE: &str = "CREATE TABLE IF NOT EXISTS dlq_processing_metrics (
    id SERIAL PRIMARY KEY,
    processing_method VARCHAR(32) NOT NULL,
    batch_id VARCHAR(64),
    processor_id VARCHAR(64),
    events_processed INTEGER NOT NULL DEFAULT 0,
    events_repaired INTEGER NOT NULL DEFAULT 0,
    events_failed INTEGER NOT NULL DEFAULT 0,
    events_skipped INTEGER NOT NULL DEFAULT 0,
    processing_duration_ms INTEGER NOT NULL DEFAULT 0,
    avg_processing_time_ms INTEGER,
    peak_memory_mb INTEGER,
    circuit_breaker_triggered BOOLEAN NOT NULL DEFAULT FALSE,
    rate_limit_hits INTEGER NOT NULL DEFAULT 0,
    lock_timeouts INTEGER NOT NULL DEFAULT 0,
    started_at TIMESTAMP WITH TIME ZONE NOT NULL,
    completed_at TIMESTAMP WITH TIME ZONE NOT NULL,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
)";

const CIRCUIT_BREAKER_TABLE: &str = "CREATE TABLE IF NOT EXISTS dlq_circuit_breaker_state (
    id SERIAL PRIMARY KEY,
    breaker_name VARCHAR(64) NOT NULL UNIQUE,
    state VARCHAR(16) NOT NULL DEFAULT 'closed'
        CHECK (state IN ('closed', 'open', 'half_open')),
    failure_count INTEGER NOT NULL DEFAULT 0,
    failure_threshold INTEGER NOT NULL DEFAULT 5,
    timeout_seconds INTEGER NOT NULL DEFAULT 60,
    last_failure_time TIMESTAMP WITH TIME ZONE,
    next_attempt_time TIMESTAMP WITH TIME ZONE,
    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
)";

const SUPPORT_INDEXES: &[IndexSpec] = &[
    (
        "ix_dlq_metrics_method_started",
        "dlq_processing_metrics",
        "processing_method, started_at",
    ),
    ("ix_dlq_metrics_batch", "dlq_processing_metrics", "batch_id"),
    (
        "ix_dlq_circuit_breaker_state",
        "dlq_circuit_breaker_state",
        "state, next_attempt_time",
    ),
];

const HEALTH_VIEW: &str = "CREATE OR REPLACE VIEW dlq_health AS
SELECT
    COUNT(*) FILTER (WHERE NOT resolved) AS pending_events,
    COUNT(*) FILTER (WHERE resolved) AS processed_events,
    COUNT(*) FILTER (WHERE processing_lock IS NOT NULL AND lock_expires_at > NOW()) AS locked_events,
    COUNT(*) FILTER (WHERE NOT resolved AND retry_count >= 5) AS high_retry_events,
    COUNT(*) FILTER (WHERE NOT resolved AND priority <= 3) AS high_priority_events,
    AVG(EXTRACT(EPOCH FROM (resolved_at - created_at)))
        FILTER (WHERE resolved AND resolved_at IS NOT NULL) AS avg_resolution_time_seconds,
    MIN(created_at) FILTER (WHERE NOT resolved) AS oldest_unresolved_event
FROM dead_letter_events";

/// Trigger function maintaining `updated_at`.
pub const UPDATED_AT_FUNCTION: &str = "update_updated_at_column";

const UPDATED_AT_FUNCTION_SQL: &str = "CREATE OR REPLACE FUNCTION update_updated_at_column()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql";

const UPDATED_AT_TABLES: &[&str] = &["dead_letter_events", "dlq_circuit_breaker_state"];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    if !ctx.is_postgres() {
        ctx.skip("dead letter queue hardening", "PostgreSQL-only feature");
        return Ok(());
    }
    ctx.require_table("dead_letter_events")?;

    for (column, definition) in dlq_columns(&ctx.types()) {
        ctx.ensure_column(StepKind::BestEffort, "dead_letter_events", column, &definition)?;
    }

    for (name, sql) in DLQ_INDEXES {
        ctx.ensure_index(StepKind::BestEffort, name, sql)?;
    }

    ctx.ensure_check_constraint(
        StepKind::BestEffort,
        "dead_letter_events",
        "ck_retry_count_non_negative",
        "retry_count >= 0",
    )?;
    ctx.ensure_check_constraint(
        StepKind::BestEffort,
        "dead_letter_events",
        "ck_priority_range",
        "priority BETWEEN 1 AND 10",
    )?;
    ctx.ensure_unique_constraint(
        StepKind::BestEffort,
        "dead_letter_events",
        "uq_idempotency_key",
        "idempotency_key",
    )?;

    ctx.ensure_table(StepKind::BestEffort, "dlq_processing_metrics", METRICS_TABLE)?;
    ctx.ensure_table(
        StepKind::BestEffort,
        "dlq_circuit_breaker_state",
        CIRCUIT_BREAKER_TABLE,
    )?;
    ensure_indexes(ctx, StepKind::BestEffort, SUPPORT_INDEXES)?;

    ctx.ensure_view(StepKind::BestEffort, "dlq_health", HEALTH_VIEW)?;

    ctx.ensure_function(StepKind::BestEffort, UPDATED_AT_FUNCTION, UPDATED_AT_FUNCTION_SQL)?;
    if function_exists(ctx.db(), UPDATED_AT_FUNCTION) {
        for table in UPDATED_AT_TABLES {
            let trigger = format!("update_{table}_updated_at");
            let sql = format!(
                "CREATE TRIGGER {trigger} BEFORE UPDATE ON {table} \
                 FOR EACH ROW EXECUTE FUNCTION {UPDATED_AT_FUNCTION}()"
            );
            ctx.ensure_trigger(StepKind::BestEffort, table, &trigger, &sql)?;
        }
    }

    backfill_identity(ctx)
}

/// Compute checksum and idempotency key for rows that predate v7.
fn backfill_identity(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    if !extension_installed(ctx.db(), CRYPTO_EXTENSION) {
        ctx.skip(
            "dead letter checksum backfill",
            "pgcrypto extension is not installed",
        );
        return Ok(());
    }
    ctx.backfill(
        &format!(
            "UPDATE dead_letter_events SET payload_checksum = {PAYLOAD_CHECKSUM_SQL} \
             WHERE payload_checksum IS NULL"
        ),
        "Backfilled dead_letter_events.payload_checksum",
    )?;
    ctx.backfill(
        &format!(
            "UPDATE dead_letter_events SET idempotency_key = {IDEMPOTENCY_KEY_SQL} \
             WHERE idempotency_key IS NULL AND payload_checksum IS NOT NULL"
        ),
        "Backfilled dead_letter_events.idempotency_key",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_sql::DatabaseType;

    #[test]
    fn column_definitions_follow_postgres_types() {
        let columns = dlq_columns(&DatabaseType::Postgresql.dialect().column_types());
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, DLQ_COLUMN_NAMES);

        let definition = |name: &str| {
            columns
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, d)| d.as_str())
                .unwrap()
        };
        assert_eq!(definition("error_history"), "JSONB NOT NULL DEFAULT '[]'::jsonb");
        assert_eq!(
            definition("updated_at"),
            "TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()"
        );
        assert_eq!(definition("lock_expires_at"), "TIMESTAMP WITH TIME ZONE");
    }
}
