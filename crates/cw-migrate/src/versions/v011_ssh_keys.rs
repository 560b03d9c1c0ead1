//! v11: SSH key injection intelligence.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_ssh_key_fingerprint", "ssh_key_intelligence", "key_fingerprint"),
    ("ix_ssh_key_type", "ssh_key_intelligence", "key_type"),
    ("ix_ssh_key_first_seen", "ssh_key_intelligence", "first_seen"),
    ("ix_ssh_key_last_seen", "ssh_key_intelligence", "last_seen"),
    ("ix_session_ssh_keys_session", "session_ssh_keys", "session_id"),
    ("ix_session_ssh_keys_key", "session_ssh_keys", "ssh_key_id"),
    ("ix_session_ssh_keys_timestamp", "session_ssh_keys", "timestamp"),
    ("ix_ssh_key_associations_key1", "ssh_key_associations", "key_id_1"),
    ("ix_ssh_key_associations_key2", "ssh_key_associations", "key_id_2"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let keys = format!(
        "CREATE TABLE IF NOT EXISTS ssh_key_intelligence (
    id {pk},
    key_type VARCHAR(32) NOT NULL,
    key_data TEXT NOT NULL,
    key_fingerprint VARCHAR(64) NOT NULL,
    key_hash VARCHAR(64) NOT NULL UNIQUE,
    key_comment TEXT,
    key_bits INTEGER,
    key_full TEXT NOT NULL,
    pattern_type VARCHAR(32) NOT NULL,
    target_path TEXT,
    first_seen {ts} NOT NULL,
    last_seen {ts} NOT NULL,
    total_attempts INTEGER NOT NULL DEFAULT 1,
    unique_sources INTEGER NOT NULL DEFAULT 1,
    unique_sessions INTEGER NOT NULL DEFAULT 1,
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        ts = t.timestamp,
    );
    let session_keys = format!(
        "CREATE TABLE IF NOT EXISTS session_ssh_keys (
    id {pk},
    session_id VARCHAR(64) NOT NULL,
    ssh_key_id INTEGER NOT NULL REFERENCES ssh_key_intelligence(id) ON DELETE CASCADE,
    command_text TEXT,
    command_hash VARCHAR(64),
    injection_method VARCHAR(32) NOT NULL,
    timestamp {ts} NOT NULL,
    source_ip VARCHAR(45),
    successful_injection {boolean} NOT NULL DEFAULT FALSE
)",
        pk = t.serial_pk,
        ts = t.timestamp,
        boolean = t.boolean,
    );
    let associations = format!(
        "CREATE TABLE IF NOT EXISTS ssh_key_associations (
    id {pk},
    key_id_1 INTEGER NOT NULL REFERENCES ssh_key_intelligence(id) ON DELETE CASCADE,
    key_id_2 INTEGER NOT NULL REFERENCES ssh_key_intelligence(id) ON DELETE CASCADE,
    co_occurrence_count INTEGER NOT NULL DEFAULT 1,
    same_session_count INTEGER NOT NULL DEFAULT 0,
    same_ip_count INTEGER NOT NULL DEFAULT 0,
    first_seen {ts} NOT NULL,
    last_seen {ts} NOT NULL,
    CONSTRAINT uq_ssh_key_association UNIQUE (key_id_1, key_id_2),
    CONSTRAINT ck_ssh_key_association_order CHECK (key_id_1 < key_id_2)
)",
        pk = t.serial_pk,
        ts = t.timestamp,
    );

    ctx.ensure_table(StepKind::Required, "ssh_key_intelligence", &keys)?;
    ctx.ensure_table(StepKind::Required, "session_ssh_keys", &session_keys)?;
    ctx.ensure_table(StepKind::Required, "ssh_key_associations", &associations)?;

    for column in ["ssh_key_injections", "unique_ssh_keys"] {
        ctx.ensure_column(
            StepKind::Required,
            "session_summaries",
            column,
            "INTEGER NOT NULL DEFAULT 0",
        )?;
    }

    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
