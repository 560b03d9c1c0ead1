//! Base table declarations.
//!
//! These are the tables every deployment has before the ledger is read.
//! They are created with `CREATE TABLE IF NOT EXISTS` in their original
//! (version 1) shape; later columns and all indexes belong to the version
//! that introduced them, so a pre-existing older table is upgraded in place.

use cw_sql::{ColumnTypes, DatabaseType};

/// A base table and its create statement for one engine.
pub struct BaseTable {
    pub name: &'static str,
    pub create_sql: String,
}

/// Names of the base tables, in creation order.
pub const BASE_TABLE_NAMES: &[&str] = &[
    "schema_state",
    "raw_events",
    "session_summaries",
    "command_stats",
    "ingest_cursors",
    "dead_letter_events",
];

/// Create statements for every base table on `db_type`.
pub fn base_tables(db_type: DatabaseType) -> Vec<BaseTable> {
    let t = db_type.dialect().column_types();
    vec![
        BaseTable {
            name: "schema_state",
            create_sql: "CREATE TABLE IF NOT EXISTS schema_state (\n    \
                 key VARCHAR(128) PRIMARY KEY,\n    \
                 value TEXT NOT NULL\n)"
                .to_string(),
        },
        BaseTable {
            name: "raw_events",
            create_sql: raw_events(&t),
        },
        BaseTable {
            name: "session_summaries",
            create_sql: session_summaries(&t),
        },
        BaseTable {
            name: "command_stats",
            create_sql: command_stats(&t),
        },
        BaseTable {
            name: "ingest_cursors",
            create_sql: ingest_cursors(&t),
        },
        BaseTable {
            name: "dead_letter_events",
            create_sql: dead_letter_events(&t),
        },
    ]
}

fn raw_events(t: &ColumnTypes) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS raw_events (
    id {pk},
    ingested_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    source VARCHAR(512) NOT NULL,
    source_offset {bigint},
    source_inode VARCHAR(128),
    risk_score INTEGER,
    quarantined {boolean} NOT NULL DEFAULT FALSE,
    payload {json} NOT NULL
)",
        pk = t.bigserial_pk,
        ts = t.timestamp,
        bigint = t.bigint,
        boolean = t.boolean,
        json = t.json,
    )
}

fn session_summaries(t: &ColumnTypes) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS session_summaries (
    session_id VARCHAR(64) PRIMARY KEY,
    first_event_at {ts},
    last_event_at {ts},
    event_count INTEGER NOT NULL DEFAULT 0,
    command_count INTEGER NOT NULL DEFAULT 0,
    file_downloads INTEGER NOT NULL DEFAULT 0,
    login_attempts INTEGER NOT NULL DEFAULT 0,
    vt_flagged {boolean} NOT NULL DEFAULT FALSE,
    dshield_flagged {boolean} NOT NULL DEFAULT FALSE,
    risk_score INTEGER,
    matcher VARCHAR(32),
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        ts = t.timestamp,
        boolean = t.boolean,
    )
}

fn command_stats(t: &ColumnTypes) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS command_stats (
    id {pk},
    session_id VARCHAR(64) NOT NULL,
    command_normalized TEXT NOT NULL,
    occurrences INTEGER NOT NULL DEFAULT 1,
    first_seen {ts},
    last_seen {ts},
    high_risk {boolean} NOT NULL DEFAULT FALSE
)",
        pk = t.serial_pk,
        ts = t.timestamp,
        boolean = t.boolean,
    )
}

fn ingest_cursors(t: &ColumnTypes) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS ingest_cursors (
    source VARCHAR(512) PRIMARY KEY,
    inode VARCHAR(128),
    last_offset {bigint} NOT NULL DEFAULT 0,
    last_ingest_at {ts},
    last_ingest_id VARCHAR(64),
    metadata_json {json}
)",
        bigint = t.bigint,
        ts = t.timestamp,
        json = t.json,
    )
}

fn dead_letter_events(t: &ColumnTypes) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS dead_letter_events (
    id {pk},
    ingest_id VARCHAR(64),
    source VARCHAR(512),
    source_offset {bigint},
    reason VARCHAR(128) NOT NULL,
    payload {json} NOT NULL,
    metadata_json {json},
    resolved {boolean} NOT NULL DEFAULT FALSE,
    resolved_at {ts},
    created_at {ts} NOT NULL DEFAULT CURRENT_TIMESTAMP
)",
        pk = t.serial_pk,
        bigint = t.bigint,
        json = t.json,
        boolean = t.boolean,
        ts = t.timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_declarations() {
        for db_type in [DatabaseType::Sqlite, DatabaseType::Postgresql] {
            let names: Vec<&str> = base_tables(db_type).iter().map(|t| t.name).collect();
            assert_eq!(names, BASE_TABLE_NAMES);
        }
    }

    #[test]
    fn statements_parse_in_their_dialect() {
        for db_type in [DatabaseType::Sqlite, DatabaseType::Postgresql] {
            for table in base_tables(db_type) {
                let parsed = db_type.dialect().parse(&table.create_sql);
                assert!(parsed.is_ok(), "{db_type} {}: {parsed:?}", table.name);
            }
        }
    }

    #[test]
    fn engine_specific_types() {
        let pg = base_tables(DatabaseType::Postgresql);
        let raw = &pg[1].create_sql;
        assert!(raw.contains("BIGSERIAL PRIMARY KEY"));
        assert!(raw.contains("payload JSONB NOT NULL"));

        let lite = base_tables(DatabaseType::Sqlite);
        let raw = &lite[1].create_sql;
        assert!(raw.contains("INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(raw.contains("payload TEXT NOT NULL"));
    }
}
