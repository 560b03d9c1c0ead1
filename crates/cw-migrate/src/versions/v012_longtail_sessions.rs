//! v12: many-to-many link between longtail detections and sessions.

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const TABLE: &str = "CREATE TABLE IF NOT EXISTS longtail_detection_sessions (
    detection_id INTEGER NOT NULL REFERENCES longtail_detections(id) ON DELETE CASCADE,
    session_id VARCHAR(64) NOT NULL,
    PRIMARY KEY (detection_id, session_id)
)";

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("longtail_detections")?;
    ctx.ensure_table(StepKind::Required, "longtail_detection_sessions", TABLE)?;
    ctx.ensure_simple_index(
        StepKind::BestEffort,
        "ix_longtail_detection_sessions_session",
        "longtail_detection_sessions",
        "session_id",
    )?;
    Ok(())
}
