//! v13: ASN and IP inventories.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_asn_inventory_org_country", "asn_inventory", "organization_country"),
    ("ix_asn_inventory_session_count", "asn_inventory", "total_session_count"),
    ("ix_ip_inventory_current_asn", "ip_inventory", "current_asn"),
    ("ix_ip_inventory_last_seen", "ip_inventory", "last_seen"),
    ("ix_ip_inventory_enrichment_updated", "ip_inventory", "enrichment_updated_at"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let asn = format!(
        "CREATE TABLE IF NOT EXISTS asn_inventory (
    asn_number INTEGER PRIMARY KEY,
    organization_name TEXT,
    organization_country VARCHAR(2),
    rir_registry VARCHAR(10),
    asn_type VARCHAR(32),
    is_known_hosting {boolean} NOT NULL DEFAULT FALSE,
    is_known_vpn {boolean} NOT NULL DEFAULT FALSE,
    first_seen {ts} NOT NULL,
    last_seen {ts} NOT NULL,
    unique_ip_count INTEGER NOT NULL DEFAULT 0,
    total_session_count INTEGER NOT NULL DEFAULT 0,
    enrichment {json} NOT NULL DEFAULT {empty_object},
    enrichment_updated_at {ts},
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        boolean = t.boolean,
        ts = t.timestamp,
        json = t.json,
        empty_object = t.empty_json_object,
    );
    let ip = format!(
        "CREATE TABLE IF NOT EXISTS ip_inventory (
    ip_address VARCHAR(45) PRIMARY KEY,
    current_asn INTEGER REFERENCES asn_inventory(asn_number),
    asn_last_verified {ts},
    first_seen {ts} NOT NULL,
    last_seen {ts} NOT NULL,
    session_count INTEGER NOT NULL DEFAULT 1,
    enrichment {json} NOT NULL DEFAULT {empty_object},
    enrichment_updated_at {ts},
    enrichment_version VARCHAR(10) DEFAULT '2.2',
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        ts = t.timestamp,
        json = t.json,
        empty_object = t.empty_json_object,
    );

    ctx.ensure_table(StepKind::Required, "asn_inventory", &asn)?;
    ctx.ensure_table(StepKind::Required, "ip_inventory", &ip)?;
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
