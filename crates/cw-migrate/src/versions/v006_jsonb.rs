//! v6: convert remaining `json` columns to `jsonb` and index session
//! enrichment (PostgreSQL only).

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;
use crate::introspect::column_type;

/// GIN index over `session_summaries.enrichment`.
pub const ENRICHMENT_GIN_INDEX: &str = "ix_session_summaries_enrichment_gin";

const JSON_COLUMNS: &[(&str, &str)] = &[
    ("raw_events", "payload"),
    ("session_summaries", "enrichment"),
    ("ingest_cursors", "metadata_json"),
    ("dead_letter_events", "payload"),
    ("dead_letter_events", "metadata_json"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    if !ctx.is_postgres() {
        ctx.skip("JSONB conversion", "SQLite stores JSON as TEXT");
        return Ok(());
    }

    for (table, column) in JSON_COLUMNS {
        if column_type(ctx.db(), table, column).as_deref() != Some("json") {
            continue;
        }
        ctx.alter(
            StepKind::BestEffort,
            &format!("ALTER TABLE {table} ALTER COLUMN {column} TYPE JSONB USING {column}::jsonb"),
            &format!("Converted {table}.{column} to JSONB"),
        )?;
    }

    ctx.ensure_index(
        StepKind::BestEffort,
        ENRICHMENT_GIN_INDEX,
        &format!(
            "CREATE INDEX IF NOT EXISTS {ENRICHMENT_GIN_INDEX} \
             ON session_summaries USING GIN (enrichment)"
        ),
    )?;
    Ok(())
}
