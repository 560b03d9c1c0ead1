//! v14: point-in-time enrichment snapshot columns on session summaries,
//! backfilled from the enrichment document and the session's first event.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_session_summaries_source_ip", "session_summaries", "source_ip"),
    ("ix_session_summaries_snapshot_asn", "session_summaries", "snapshot_asn"),
    ("ix_session_summaries_snapshot_country", "session_summaries", "snapshot_country"),
    ("ix_session_summaries_first_event_country", "session_summaries", "first_event_at, snapshot_country"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("session_summaries")?;
    let ts = ctx.types().timestamp;
    for (column, declared) in [
        ("source_ip", "VARCHAR(45)"),
        ("snapshot_asn", "INTEGER"),
        ("snapshot_country", "VARCHAR(2)"),
        ("snapshot_ip_type", "VARCHAR(32)"),
        ("enrichment_at", ts),
    ] {
        ctx.ensure_column(StepKind::Required, "session_summaries", column, declared)?;
    }

    let dialect = ctx.dialect();
    let asn = dialect.json_nested_field("enrichment", "dshield.ip.asn")?;
    let country = dialect.json_nested_field("enrichment", "dshield.ip.ascountry")?;
    let ip_type = dialect.json_nested_field("enrichment", "spur.infrastructure")?;
    let src_ip = dialect.json_field("r.payload", "src_ip")?;

    ctx.backfill_column(
        "session_summaries",
        "snapshot_asn",
        &format!("CAST({asn} AS INTEGER)"),
    )?;
    ctx.backfill_column("session_summaries", "snapshot_country", &country)?;
    ctx.backfill_column("session_summaries", "snapshot_ip_type", &ip_type)?;
    ctx.backfill_column(
        "session_summaries",
        "source_ip",
        &format!(
            "(SELECT {src_ip} FROM raw_events r \
             WHERE r.session_id = session_summaries.session_id AND {src_ip} IS NOT NULL \
             ORDER BY r.id LIMIT 1)"
        ),
    )?;
    ctx.backfill(
        "UPDATE session_summaries SET enrichment_at = updated_at \
         WHERE enrichment_at IS NULL AND enrichment IS NOT NULL",
        "Backfilled session_summaries.enrichment_at",
    )?;

    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
