use super::*;
use cw_db::SqliteBackend;

fn db() -> SqliteBackend {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE raw_events (
            id INTEGER PRIMARY KEY,
            payload TEXT NOT NULL,
            session_id TEXT GENERATED ALWAYS AS (json_extract(payload, '$.session')) VIRTUAL,
            event_type TEXT
        );
        CREATE INDEX ix_raw_events_event_type ON raw_events(event_type);
        CREATE VIEW recent_events AS SELECT id FROM raw_events;
        CREATE TRIGGER raw_events_touch AFTER INSERT ON raw_events BEGIN SELECT 1; END;",
    )
    .unwrap();
    db
}

#[test]
fn table_exists_reports_tables_only() {
    let mut db = db();
    assert!(table_exists(&mut db, "raw_events"));
    assert!(!table_exists(&mut db, "recent_events"));
    assert!(!table_exists(&mut db, "missing"));
}

#[test]
fn table_exists_sees_uncommitted_ddl() {
    let mut db = db();
    db.begin().unwrap();
    db.execute_batch("CREATE TABLE staged (id INTEGER)").unwrap();
    assert!(table_exists(&mut db, "staged"));
    db.commit().unwrap();
    assert!(table_exists(&mut db, "staged"));
}

#[test]
fn column_exists_handles_missing_table() {
    let mut db = db();
    assert!(column_exists(&mut db, "raw_events", "payload"));
    assert!(column_exists(&mut db, "raw_events", "session_id"));
    assert!(!column_exists(&mut db, "raw_events", "event_timestamp"));
    assert!(!column_exists(&mut db, "missing", "payload"));
}

#[test]
fn generated_column_detection() {
    let mut db = db();
    assert!(is_generated_column(&mut db, "raw_events", "session_id"));
    assert!(!is_generated_column(&mut db, "raw_events", "event_type"));
    assert!(!is_generated_column(&mut db, "raw_events", "nope"));
    assert!(!is_generated_column(&mut db, "missing", "session_id"));
}

#[test]
fn column_type_reports_declared_type() {
    let mut db = db();
    assert_eq!(
        column_type(&mut db, "raw_events", "payload").as_deref(),
        Some("TEXT")
    );
    assert_eq!(column_type(&mut db, "raw_events", "nope"), None);
}

#[test]
fn index_view_trigger_probes() {
    let mut db = db();
    assert!(index_exists(&mut db, "ix_raw_events_event_type"));
    assert!(!index_exists(&mut db, "ix_missing"));
    assert!(view_exists(&mut db, "recent_events"));
    assert!(!view_exists(&mut db, "raw_events"));
    assert!(trigger_exists(&mut db, "raw_events", "raw_events_touch"));
    assert!(!trigger_exists(&mut db, "other", "raw_events_touch"));
}

#[test]
fn postgres_only_probes_are_false_on_sqlite() {
    let mut db = db();
    assert!(!constraint_exists(&mut db, "raw_events", "anything"));
    assert!(!function_exists(&mut db, "update_updated_at_column"));
}
