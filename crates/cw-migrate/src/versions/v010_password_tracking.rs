//! v10: attempted passwords and their per-session usage.

use super::{ensure_indexes, IndexSpec};
use crate::context::{MigrationContext, StepKind};
use crate::error::MigrateResult;

const INDEXES: &[IndexSpec] = &[
    ("ix_password_tracking_last_seen", "password_tracking", "last_seen"),
    ("ix_password_tracking_breached", "password_tracking", "breached"),
    ("ix_password_tracking_times_seen", "password_tracking", "times_seen"),
    ("ix_password_session_usage_password", "password_session_usage", "password_id"),
    ("ix_password_session_usage_session", "password_session_usage", "session_id"),
    ("ix_password_session_usage_timestamp", "password_session_usage", "timestamp"),
];

pub fn up(ctx: &mut MigrationContext<'_>) -> MigrateResult<()> {
    let t = ctx.types();
    let tracking = format!(
        "CREATE TABLE IF NOT EXISTS password_tracking (
    id {pk},
    password_hash VARCHAR(64) NOT NULL UNIQUE,
    password_text TEXT NOT NULL,
    breached {boolean} NOT NULL DEFAULT FALSE,
    breach_prevalence INTEGER,
    last_hibp_check {ts},
    first_seen {ts} NOT NULL,
    last_seen {ts} NOT NULL,
    times_seen INTEGER NOT NULL DEFAULT 1,
    unique_sessions INTEGER NOT NULL DEFAULT 1,
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        boolean = t.boolean,
        ts = t.timestamp,
    );
    let usage = format!(
        "CREATE TABLE IF NOT EXISTS password_session_usage (
    id {pk},
    password_id INTEGER NOT NULL REFERENCES password_tracking(id) ON DELETE CASCADE,
    session_id VARCHAR(64) NOT NULL,
    username VARCHAR(256),
    success {boolean} NOT NULL DEFAULT FALSE,
    timestamp {ts} NOT NULL,
    CONSTRAINT uq_password_session UNIQUE (password_id, session_id)
)",
        pk = t.serial_pk,
        boolean = t.boolean,
        ts = t.timestamp,
    );

    ctx.ensure_table(StepKind::Required, "password_tracking", &tracking)?;
    ctx.ensure_table(StepKind::Required, "password_session_usage", &usage)?;
    ensure_indexes(ctx, StepKind::BestEffort, INDEXES)
}
