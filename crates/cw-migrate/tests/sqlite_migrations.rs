//! End-to-end migration runs against SQLite databases.

use cw_db::{Database, Engine, SqlValue, SqliteBackend};
use cw_migrate::{
    apply_migrations, apply_migrations_with, column_exists, get_version, introspect,
    is_generated_column, migrate_to, rollback_to, set_version, table_exists, MigrationOptions,
    PostgresOnlyArtifacts, CURRENT_SCHEMA_VERSION,
};
use cw_sql::json::{get_field, get_nested_field};
use cw_sql::DatabaseType;

// ── Helpers ────────────────────────────────────────────────────────────

fn count(db: &mut dyn Database, sql: &str) -> i64 {
    db.query_scalar(sql, &[]).unwrap().as_i64().unwrap()
}

fn text(db: &mut dyn Database, sql: &str) -> Option<String> {
    db.query_scalar(sql, &[]).unwrap().as_text()
}

/// Pre-v5 `raw_events` whose `session_id` is computed by the engine.
const RAW_EVENTS_WITH_GENERATED_SESSION: &str = "CREATE TABLE raw_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ingested_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    source VARCHAR(512) NOT NULL,
    source_offset INTEGER,
    source_inode VARCHAR(128),
    risk_score INTEGER,
    quarantined BOOLEAN NOT NULL DEFAULT FALSE,
    payload TEXT NOT NULL,
    session_id TEXT GENERATED ALWAYS AS (json_extract(payload, '$.session')) VIRTUAL
)";

const LOGIN_PAYLOAD: &str = r#"{"session": "abc123", "eventid": "cowrie.login.success", "timestamp": "2025-01-01T00:00:00Z", "src_ip": "203.0.113.7"}"#;

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn fresh_file_database_reaches_current_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cowrie.sqlite");
    let engine = Engine::from_url(&format!("sqlite:///{}", path.display())).unwrap();

    let mut db = engine.connect().unwrap();
    assert_eq!(apply_migrations(db.as_mut()).unwrap(), CURRENT_SCHEMA_VERSION);
    drop(db);

    // The ledger survives reopening.
    let mut db = engine.connect().unwrap();
    let rows = db.query("SELECT key, value FROM schema_state", &[]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_string(0).unwrap(), "schema_version");
    assert_eq!(rows[0].get_string(1).unwrap(), CURRENT_SCHEMA_VERSION.to_string());
}

#[test]
fn payload_fields_backfilled_when_crossing_v5() {
    let mut db = SqliteBackend::in_memory().unwrap();
    migrate_to(&mut db, 4, &MigrationOptions::default()).unwrap();
    db.execute(
        "INSERT INTO raw_events (source, source_offset, payload) VALUES (?1, ?2, ?3)",
        &[
            SqlValue::from("/var/log/cowrie/cowrie.json"),
            SqlValue::from(0_i64),
            SqlValue::from(LOGIN_PAYLOAD),
        ],
    )
    .unwrap();

    apply_migrations(&mut db).unwrap();

    let row = db
        .query_opt(
            "SELECT session_id, event_type, event_timestamp FROM raw_events",
            &[],
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get_string(0).unwrap(), "abc123");
    assert_eq!(row.get_string(1).unwrap(), "cowrie.login.success");
    assert_eq!(row.get_string(2).unwrap(), "2025-01-01T00:00:00Z");
}

#[test]
fn generated_session_column_is_neither_redeclared_nor_written() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(RAW_EVENTS_WITH_GENERATED_SESSION).unwrap();
    db.execute(
        "INSERT INTO raw_events (source, payload) VALUES (?1, ?2)",
        &[SqlValue::from("cowrie.json"), SqlValue::from(LOGIN_PAYLOAD)],
    )
    .unwrap();

    let outcome = apply_migrations_with(&mut db, &MigrationOptions::default()).unwrap();
    assert_eq!(outcome.to_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(outcome.advisory_failures, 0);

    let columns = db.list_columns("raw_events").unwrap();
    assert_eq!(columns.iter().filter(|c| c.name == "session_id").count(), 1);
    assert!(is_generated_column(&mut db, "raw_events", "session_id"));
    assert!(!is_generated_column(&mut db, "raw_events", "event_type"));

    assert_eq!(
        text(&mut db, "SELECT session_id FROM raw_events").as_deref(),
        Some("abc123")
    );
    assert_eq!(
        text(&mut db, "SELECT event_type FROM raw_events").as_deref(),
        Some("cowrie.login.success")
    );
    assert!(introspect::index_exists(&mut db, "ix_raw_events_session_id"));
}

#[test]
fn second_run_makes_no_structural_changes() {
    let mut db = SqliteBackend::in_memory().unwrap();
    let first = apply_migrations_with(&mut db, &MigrationOptions::default()).unwrap();
    let second = apply_migrations_with(&mut db, &MigrationOptions::default()).unwrap();

    assert_eq!(first.to_version, second.to_version);
    assert_eq!(second.structural_changes, 0);
    assert_eq!(second.applied(), 0);
}

#[test]
fn replaying_every_version_over_existing_schema_is_inert() {
    let mut db = SqliteBackend::in_memory().unwrap();
    apply_migrations(&mut db).unwrap();

    // A crash after DDL but before the ledger write looks like this.
    set_version(&mut db, 0).unwrap();

    let replay = apply_migrations_with(&mut db, &MigrationOptions::default()).unwrap();
    assert_eq!(replay.from_version, 0);
    assert_eq!(replay.to_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(replay.structural_changes, 0);
    assert_eq!(replay.advisory_failures, 0);
}

#[test]
fn ledger_is_monotonic_across_partial_runs() {
    let mut db = SqliteBackend::in_memory().unwrap();
    let mut seen = vec![get_version(&mut db)];
    for target in [2, 2, 7, 11, CURRENT_SCHEMA_VERSION, 5] {
        migrate_to(&mut db, target, &MigrationOptions::default()).unwrap();
        seen.push(get_version(&mut db));
    }
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(seen.last(), Some(&CURRENT_SCHEMA_VERSION));
}

#[test]
fn longtail_downgrade_moves_ledger_back() {
    let mut db = SqliteBackend::in_memory().unwrap();
    migrate_to(&mut db, 9, &MigrationOptions::default()).unwrap();
    assert!(table_exists(&mut db, "longtail_analysis"));
    assert!(table_exists(&mut db, "longtail_detections"));

    let outcome = rollback_to(&mut db, 8).unwrap();
    assert_eq!((outcome.from_version, outcome.to_version), (9, 8));
    assert_eq!(get_version(&mut db), 8);
    assert_eq!(
        count(&mut db, "SELECT COUNT(*) FROM schema_state WHERE key = 'schema_version'"),
        1
    );
    assert!(!table_exists(&mut db, "longtail_analysis"));
    assert!(!table_exists(&mut db, "longtail_detections"));
    assert!(table_exists(&mut db, "snowshoe_detections"));

    // And forward again.
    assert_eq!(apply_migrations(&mut db).unwrap(), CURRENT_SCHEMA_VERSION);
    assert!(table_exists(&mut db, "longtail_detections"));
}

#[test]
fn sqlite_reaches_current_version_without_postgres_artifacts() {
    let mut db = SqliteBackend::in_memory().unwrap();
    assert_eq!(apply_migrations(&mut db).unwrap(), CURRENT_SCHEMA_VERSION);

    for table in PostgresOnlyArtifacts::TABLES {
        assert!(!table_exists(&mut db, table), "{table}");
    }
    for view in PostgresOnlyArtifacts::VIEWS {
        assert!(!introspect::view_exists(&mut db, view), "{view}");
    }
    for index in PostgresOnlyArtifacts::INDEXES {
        assert!(!introspect::index_exists(&mut db, index), "{index}");
    }
    for column in PostgresOnlyArtifacts::dead_letter_columns() {
        assert!(!column_exists(&mut db, "dead_letter_events", column), "{column}");
    }

    for table in [
        "files",
        "snowshoe_detections",
        "longtail_detection_sessions",
        "password_session_usage",
        "ssh_key_associations",
        "ip_asn_history",
    ] {
        assert!(table_exists(&mut db, table), "{table}");
    }
    assert!(column_exists(&mut db, "ip_inventory", "is_scanner"));
    assert!(column_exists(&mut db, "session_summaries", "snapshot_asn"));
}

#[test]
fn foreign_keys_cascade_after_migration() {
    let mut db = SqliteBackend::in_memory().unwrap();
    apply_migrations(&mut db).unwrap();
    db.execute_batch(
        "INSERT INTO asn_inventory (asn_number, first_seen, last_seen) VALUES (64500, '2025-01-01', '2025-01-02');
         INSERT INTO ip_inventory (ip_address, current_asn, first_seen, last_seen)
             VALUES ('198.51.100.4', 64500, '2025-01-01', '2025-01-02');
         INSERT INTO ip_asn_history (ip_address, asn_number, observed_at, verification_source)
             VALUES ('198.51.100.4', 64500, '2025-01-01', 'cymru');
         DELETE FROM ip_inventory;",
    )
    .unwrap();
    assert_eq!(count(&mut db, "SELECT COUNT(*) FROM ip_asn_history"), 0);

    let orphan = db.execute(
        "INSERT INTO ip_inventory (ip_address, current_asn, first_seen, last_seen) \
         VALUES ('198.51.100.5', 1, '2025-01-01', '2025-01-02')",
        &[],
    );
    assert!(orphan.is_err());
}

#[test]
fn snapshot_and_classification_backfills() {
    let mut db = SqliteBackend::in_memory().unwrap();
    migrate_to(&mut db, 13, &MigrationOptions::default()).unwrap();
    db.execute(
        "INSERT INTO raw_events (source, source_offset, session_id, payload) \
         VALUES ('cowrie.json', 1, 'abc123', ?1)",
        &[SqlValue::from(LOGIN_PAYLOAD)],
    )
    .unwrap();
    db.execute(
        "INSERT INTO session_summaries (session_id, enrichment) VALUES ('abc123', ?1)",
        &[SqlValue::from(
            r#"{"dshield": {"ip": {"asn": "64500", "ascountry": "NL"}}, "spur": {"infrastructure": "DATACENTER"}}"#,
        )],
    )
    .unwrap();
    db.execute(
        "INSERT INTO ip_inventory (ip_address, first_seen, last_seen, enrichment) \
         VALUES ('203.0.113.7', '2025-01-01', '2025-01-02', ?1)",
        &[SqlValue::from(
            r#"{"maxmind": {"country": "DE"}, "greynoise": {"noise": true}, "validation": {"is_bogon": false}}"#,
        )],
    )
    .unwrap();

    apply_migrations(&mut db).unwrap();

    let row = db
        .query_opt(
            "SELECT source_ip, snapshot_asn, snapshot_country, snapshot_ip_type \
             FROM session_summaries WHERE session_id = 'abc123'",
            &[],
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get_string(0).unwrap(), "203.0.113.7");
    assert_eq!(row.get_i64(1).unwrap(), 64500);
    assert_eq!(row.get_string(2).unwrap(), "NL");
    assert_eq!(row.get_string(3).unwrap(), "DATACENTER");

    let row = db
        .query_opt("SELECT geo_country, is_scanner, is_bogon FROM ip_inventory", &[])
        .unwrap()
        .unwrap();
    assert_eq!(row.get_string(0).unwrap(), "DE");
    assert!(row.get_bool(1).unwrap());
    assert!(!row.get_bool(2).unwrap());
}

#[test]
fn json_expressions_extract_seeded_values() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE docs (body TEXT)").unwrap();
    db.execute(
        "INSERT INTO docs VALUES (?1)",
        &[SqlValue::from(r#"{"eventid": "cowrie.command.input", "dshield": {"ip": {"asname": "EXAMPLE-AS"}}}"#)],
    )
    .unwrap();

    let top = get_field("body", "eventid", DatabaseType::Sqlite).unwrap();
    let nested = get_nested_field("body", "dshield.ip.asname", DatabaseType::Sqlite).unwrap();
    assert_eq!(
        text(&mut db, &format!("SELECT {top} FROM docs")).as_deref(),
        Some("cowrie.command.input")
    );
    assert_eq!(
        text(&mut db, &format!("SELECT {nested} FROM docs")).as_deref(),
        Some("EXAMPLE-AS")
    );
}
