//! v8: snowshoe spam detection results.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_snowshoe_detections_time", "snowshoe_detections", "detection_time"),
    ("ix_snowshoe_detections_window", "snowshoe_detections", "window_start, window_end"),
    ("ix_snowshoe_detections_confidence", "snowshoe_detections", "confidence_score"),
    ("ix_snowshoe_detections_likely", "snowshoe_detections", "is_likely_snowshoe"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS snowshoe_detections (
    id {pk},
    detection_time {ts} NOT NULL,
    window_start {ts} NOT NULL,
    window_end {ts} NOT NULL,
    confidence_score {float} NOT NULL,
    unique_ips INTEGER NOT NULL,
    single_attempt_ips INTEGER NOT NULL,
    geographic_spread {float},
    indicators {json} NOT NULL DEFAULT {empty_object},
    is_likely_snowshoe {boolean} NOT NULL DEFAULT FALSE,
    coordinated_timing {boolean} NOT NULL DEFAULT FALSE,
    recommendation TEXT,
    analysis_metadata {json},
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        ts = t.timestamp,
        float = t.float,
        json = t.json,
        empty_object = t.empty_json_object,
        boolean = t.boolean,
    );
    ctx.ensure_table(StepKind::Required, "snowshoe_detections", &sql)?;
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
