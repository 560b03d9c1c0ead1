//! v2: log-rotation generation counter and positional uniqueness of raw
//! events.

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

/// Unique over `(source, source_inode, source_generation, source_offset)`.
pub const SOURCE_OFFSET_INDEX: &str = "ux_raw_events_source_offset";

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("raw_events")?;
    ctx.ensure_column(
        StepKind::Required,
        "raw_events",
        "source_generation",
        "INTEGER NOT NULL DEFAULT 0",
    )?;
    ctx.backfill(
        "UPDATE raw_events SET source_generation = 0 WHERE source_generation IS NULL",
        "Backfilled raw_events.source_generation",
    )?;
    ctx.ensure_index(
        StepKind::Required,
        SOURCE_OFFSET_INDEX,
        &format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {SOURCE_OFFSET_INDEX} \
             ON raw_events (source, source_inode, source_generation, source_offset)"
        ),
    )?;
    Ok(())
}
