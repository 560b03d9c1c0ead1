//! v15: observed IP to ASN assignments over time.

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("ip_inventory")?;
    let t = ctx.types();
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS ip_asn_history (
    id {pk},
    ip_address VARCHAR(45) NOT NULL REFERENCES ip_inventory(ip_address) ON DELETE CASCADE,
    asn_number INTEGER NOT NULL,
    observed_at {ts} NOT NULL,
    verification_source VARCHAR(32) NOT NULL
)",
        pk = t.bigserial_pk,
        ts = t.timestamp,
    );
    ctx.ensure_table(StepKind::Required, "ip_asn_history", &sql)?;
    ctx.ensure_simple_index(
        StepKind::BestEffort,
        "ix_ip_asn_history_ip_observed",
        "ip_asn_history",
        "ip_address, observed_at",
    )?;
    Ok(())
}
