//! v4: downloaded artifacts, one row per (session, file hash).

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_files_session_id", "files", "session_id"),
    ("ix_files_shasum", "files", "shasum"),
    ("ix_files_vt_malicious", "files", "vt_malicious"),
    ("ix_files_enrichment_status", "files", "enrichment_status"),
    ("ix_files_first_seen", "files", "first_seen"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS files (
    id {pk},
    session_id VARCHAR(64) NOT NULL,
    shasum VARCHAR(64) NOT NULL,
    filename VARCHAR(512),
    file_size {bigint},
    download_url VARCHAR(1024),
    vt_classification VARCHAR(128),
    vt_description TEXT,
    vt_malicious {boolean} NOT NULL DEFAULT FALSE,
    vt_first_seen {ts},
    vt_last_analysis {ts},
    vt_positives INTEGER,
    vt_total INTEGER,
    vt_scan_date {ts},
    first_seen {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    last_updated {ts} DEFAULT CURRENT_TIMESTAMP,
    enrichment_status VARCHAR(20) NOT NULL DEFAULT 'pending',
    CONSTRAINT uq_files_session_shasum UNIQUE (session_id, shasum),
    CONSTRAINT ck_files_enrichment_status
        CHECK (enrichment_status IN ('pending', 'completed', 'failed'))
)",
        pk = t.serial_pk,
        bigint = t.bigint,
        boolean = t.boolean,
        ts = t.timestamp,
    );
    ctx.ensure_table(StepKind::Required, "files", &sql)?;
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
