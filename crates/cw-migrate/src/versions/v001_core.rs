//! v1: core tables and their lookup indexes.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::ddl::BASE_TABLE_NAMES;
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_raw_events_source", "raw_events", "source"),
    ("ix_raw_events_ingested_at", "raw_events", "ingested_at"),
    ("ix_session_summaries_first_event", "session_summaries", "first_event_at"),
    ("ix_session_summaries_last_event", "session_summaries", "last_event_at"),
    ("ix_command_stats_session", "command_stats", "session_id"),
    ("ix_dead_letter_events_created", "dead_letter_events", "created_at"),
    ("ix_dead_letter_events_resolved", "dead_letter_events", "resolved"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    for table in BASE_TABLE_NAMES {
        ctx.require_table(table)?;
    }
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
