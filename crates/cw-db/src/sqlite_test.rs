use super::*;
use crate::traits::with_transaction;

#[test]
fn test_in_memory() {
    let db = SqliteBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), DatabaseType::Sqlite);
    assert_eq!(db.dialect().name(), "sqlite");
}

#[test]
fn test_foreign_keys_enabled_by_default() {
    let mut db = SqliteBackend::in_memory().unwrap();
    let fk = db.query_scalar("PRAGMA foreign_keys", &[]).unwrap();
    assert_eq!(fk, SqlValue::Integer(1));
}

#[test]
fn test_execute_with_params_and_query() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT, n INTEGER, r REAL)")
        .unwrap();
    let affected = db
        .execute(
            "INSERT INTO kv (k, v, n, r) VALUES (?1, ?2, ?3, ?4)",
            &["a".into(), SqlValue::Null, 5_i64.into(), 1.5_f64.into()],
        )
        .unwrap();
    assert_eq!(affected, 1);

    let rows = db
        .query("SELECT k, v, n, r FROM kv WHERE k = ?1", &["a".into()])
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_string(0).unwrap(), "a");
    assert!(rows[0].get(1).unwrap().is_null());
    assert_eq!(rows[0].get_i64(2).unwrap(), 5);
    assert_eq!(rows[0].get_f64(3).unwrap(), 1.5);
}

#[test]
fn test_list_tables_skips_internal() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE b (id INTEGER PRIMARY KEY AUTOINCREMENT); CREATE TABLE a (id INTEGER);",
    )
    .unwrap();
    assert_eq!(db.list_tables().unwrap(), vec!["a", "b"]);
}

#[test]
fn test_list_columns_reports_generated() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE ev (
            id INTEGER PRIMARY KEY,
            payload TEXT NOT NULL,
            session_id TEXT GENERATED ALWAYS AS (json_extract(payload, '$.session')) VIRTUAL,
            event_type TEXT GENERATED ALWAYS AS (json_extract(payload, '$.eventid')) STORED
        )",
    )
    .unwrap();

    let cols = db.list_columns("ev").unwrap();
    let names: Vec<&str> = cols.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "payload", "session_id", "event_type"]);

    let payload = &cols[1];
    assert!(!payload.nullable);
    assert!(!payload.is_generated());
    assert_eq!(cols[2].hidden, 2);
    assert!(cols[2].is_generated());
    assert_eq!(cols[3].hidden, 3);
    assert!(cols[3].is_generated());
}

#[test]
fn test_list_columns_missing_table_is_empty() {
    let mut db = SqliteBackend::in_memory().unwrap();
    assert!(db.list_columns("nope").unwrap().is_empty());
}

#[test]
fn test_missing_table_error_classified() {
    let mut db = SqliteBackend::in_memory().unwrap();
    let err = db.query("SELECT * FROM nope", &[]).unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)));
}

#[test]
fn test_transaction_state() {
    let mut db = SqliteBackend::in_memory().unwrap();
    assert!(!db.in_transaction());
    db.begin().unwrap();
    assert!(db.in_transaction());
    db.rollback().unwrap();
    assert!(!db.in_transaction());
}

#[test]
fn test_with_transaction_rolls_back_on_error() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();

    let result: DbResult<()> = with_transaction(&mut db, |db| {
        db.execute("INSERT INTO t VALUES (1)", &[])?;
        db.execute("INSERT INTO missing VALUES (1)", &[])?;
        Ok(())
    });
    assert!(result.is_err());
    assert!(!db.in_transaction());
    let count = db.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
    assert_eq!(count, SqlValue::Integer(0));
}

#[test]
fn test_with_transaction_rolls_back_failed_commit() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE parent (id INTEGER PRIMARY KEY);
         CREATE TABLE child (
             parent_id INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
         );",
    )
    .unwrap();

    // The deferred foreign key is only checked at COMMIT, which leaves the
    // transaction open on failure.
    let result: DbResult<()> = with_transaction(&mut db, |db| {
        db.execute("INSERT INTO child VALUES (42)", &[])?;
        Ok(())
    });
    match result {
        Err(DbError::TransactionError(msg)) => assert!(msg.contains("COMMIT failed"), "{msg}"),
        other => panic!("expected TransactionError, got {other:?}"),
    }
    assert!(!db.in_transaction());
    let count = db.query_scalar("SELECT COUNT(*) FROM child", &[]).unwrap();
    assert_eq!(count, SqlValue::Integer(0));
}

#[test]
fn test_savepoint_rollback_keeps_outer_work() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    db.begin().unwrap();
    db.execute("INSERT INTO t VALUES (1)", &[]).unwrap();
    db.savepoint("sp1").unwrap();
    db.execute("INSERT INTO t VALUES (2)", &[]).unwrap();
    db.rollback_to_savepoint("sp1").unwrap();
    db.release_savepoint("sp1").unwrap();
    db.commit().unwrap();

    let count = db.query_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
    assert_eq!(count, SqlValue::Integer(1));
}

#[test]
fn test_file_database_applies_journal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cowrie.sqlite");
    let mut db = SqliteBackend::from_path(&path).unwrap();
    assert!(path.exists());
    let mode = db.query_scalar("PRAGMA journal_mode", &[]).unwrap();
    assert_eq!(mode, SqlValue::Text("wal".to_string()));
}

#[test]
fn test_query_scalar_no_rows() {
    let mut db = SqliteBackend::in_memory().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    let err = db.query_scalar("SELECT id FROM t", &[]).unwrap_err();
    assert!(matches!(err, DbError::NoRows(_)));
}
