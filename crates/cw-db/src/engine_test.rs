use super::*;

#[test]
fn test_memory_forms() {
    for url in [":memory:", "sqlite://", "sqlite://:memory:", "sqlite::memory:", "sqlite:///:memory:"] {
        let engine = Engine::from_url(url).unwrap();
        assert_eq!(engine.db_type(), DatabaseType::Sqlite, "{url}");
        assert_eq!(engine.sqlite_path(), None, "{url}");
    }
}

#[test]
fn test_sqlite_paths() {
    let rel = Engine::from_url("sqlite:///data/cowrie.sqlite").unwrap();
    assert_eq!(rel.sqlite_path(), Some(Path::new("data/cowrie.sqlite")));

    let abs = Engine::from_url("sqlite:////var/lib/cowrie/cowrie.sqlite").unwrap();
    assert_eq!(abs.sqlite_path(), Some(Path::new("/var/lib/cowrie/cowrie.sqlite")));
}

#[test]
fn test_postgres_forms_normalised() {
    for url in [
        "postgresql://cowrie@db/cowrie",
        "postgres://cowrie@db/cowrie",
        "postgresql+psycopg://cowrie@db/cowrie",
    ] {
        let engine = Engine::from_url(url).unwrap();
        assert_eq!(
            engine,
            Engine::Postgres {
                url: "postgresql://cowrie@db/cowrie".to_string()
            }
        );
        assert!(engine.db_type().is_postgres());
    }
}

#[test]
fn test_unsupported_urls() {
    for url in ["mysql://root@db/cowrie", "postgresql://", "postgresql+psycopg", ""] {
        let err = Engine::from_url(url).unwrap_err();
        assert!(matches!(err, DbError::UnsupportedUrl(_)), "{url}");
    }
}

#[test]
fn test_display_redacts_password() {
    let engine = Engine::from_url("postgresql://cowrie:s3cret@db:5432/cowrie").unwrap();
    let shown = engine.to_string();
    assert_eq!(shown, "postgresql://cowrie:***@db:5432/cowrie");
    assert!(!shown.contains("s3cret"));

    let err = Engine::from_url("mysql://root:hunter2@db/x").unwrap_err();
    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn test_from_config_carries_sqlite_settings() {
    let mut config = DatabaseConfig::default();
    config.url = "sqlite:///tmp/x.sqlite".to_string();
    config.sqlite.busy_timeout_ms = 250;
    let engine = Engine::from_config(&config).unwrap();
    match engine {
        Engine::Sqlite { settings, .. } => assert_eq!(settings.busy_timeout_ms, 250),
        other => panic!("expected sqlite engine, got {other:?}"),
    }
}

#[test]
fn test_connect_file_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.sqlite");
    let engine = Engine::Sqlite {
        path: Some(path.clone()),
        settings: SqliteConfig::default(),
    };
    let mut db = engine.connect().unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    drop(db);

    let mut again = engine.connect().unwrap();
    assert_eq!(again.list_tables().unwrap(), vec!["t"]);
}

#[test]
fn test_connect_memory_is_fresh_each_time() {
    let engine = Engine::from_url(":memory:").unwrap();
    let mut first = engine.connect().unwrap();
    first.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
    let mut second = engine.connect().unwrap();
    assert!(second.list_tables().unwrap().is_empty());
}
