//! v3: enrichment document on session summaries.

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let json = ctx.types().json;
    ctx.ensure_column(StepKind::Required, "session_summaries", "enrichment", json)?;
    Ok(())
}
