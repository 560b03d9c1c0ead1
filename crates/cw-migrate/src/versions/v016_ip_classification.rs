//! v16: country and scanner/bogon flags on the IP inventory, derived from
//! its enrichment document. Generated columns on SQLite are left alone.

use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

/// Partial index over scanner IPs.
pub const SCANNER_INDEX: &str = "ix_ip_inventory_scanners";

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    ctx.require_table("ip_inventory")?;
    let boolean = ctx.types().boolean;

    let columns = [
        ("geo_country", "VARCHAR(2)".to_string()),
        ("is_scanner", format!("{boolean} NOT NULL DEFAULT FALSE")),
        ("is_bogon", format!("{boolean} NOT NULL DEFAULT FALSE")),
    ];
    for (column, declared) in &columns {
        ctx.ensure_column(StepKind::Required, "ip_inventory", column, declared)?;
    }

    let dialect = ctx.dialect();
    let maxmind = dialect.json_nested_field("enrichment", "maxmind.country")?;
    let dshield = dialect.json_nested_field("enrichment", "dshield.ip.ascountry")?;
    let noise = dialect.json_nested_field("enrichment", "greynoise.noise")?;
    let bogon = dialect.json_nested_field("enrichment", "validation.is_bogon")?;

    ctx.backfill_column(
        "ip_inventory",
        "geo_country",
        &format!("COALESCE({maxmind}, {dshield})"),
    )?;
    for (column, expr) in [("is_scanner", noise), ("is_bogon", bogon)] {
        if ctx.is_generated_column("ip_inventory", column) {
            log::info!("Skipping backfill of ip_inventory.{column}: generated column");
            continue;
        }
        // JSON true reads as 'true' on PostgreSQL and 1 on SQLite.
        ctx.backfill(
            &format!(
                "UPDATE ip_inventory SET {column} = TRUE \
                 WHERE {column} = FALSE AND CAST({expr} AS TEXT) IN ('true', '1')"
            ),
            &format!("Backfilled ip_inventory.{column}"),
        )?;
    }

    ctx.ensure_simple_index(
        StepKind::BestEffort,
        "ix_ip_inventory_geo_country",
        "ip_inventory",
        "geo_country",
    )?;
    ctx.ensure_index(
        StepKind::BestEffort,
        SCANNER_INDEX,
        &format!(
            "CREATE INDEX IF NOT EXISTS {SCANNER_INDEX} ON ip_inventory (last_seen) \
             WHERE is_scanner = TRUE"
        ),
    )?;
    Ok(())
}
