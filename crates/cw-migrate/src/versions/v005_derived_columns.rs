//! v5: session id, event type and event timestamp derived from the raw
//! event payload.
//!
//! On SQLite these may already exist as generated columns; those are never
//! redeclared and never written.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

/// `(column, declared type, payload field)`
pub const DERIVED_COLUMNS: &[(&str, &str, &str)] = &[
    ("session_id", "VARCHAR(64)", "session"),
    ("event_type", "VARCHAR(128)", "eventid"),
    ("event_timestamp", "VARCHAR(64)", "timestamp"),
];

const INDEXES: &[IndexSpec] = &[
    ("ix_raw_events_session_id", "raw_events", "session_id"),
    ("ix_raw_events_event_type", "raw_events", "event_type"),
    ("ix_raw_events_event_timestamp", "raw_events", "event_timestamp"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("raw_events")?;

    for (column, declared, _) in DERIVED_COLUMNS {
        if ctx.is_generated_column("raw_events", column) {
            log::info!("raw_events.{column} is a generated column, keeping it");
            continue;
        }
        ctx.ensure_column(StepKind::Required, "raw_events", column, declared)?;
    }

    for (column, _, field) in DERIVED_COLUMNS {
        let expr = ctx.dialect().json_field("payload", field)?;
        ctx.backfill_column("raw_events", column, &expr)?;
    }

    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
