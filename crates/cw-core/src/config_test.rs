use super::*;
use serial_test::serial;

#[test]
fn test_parse_empty_config() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.database.url, "sqlite:///cowrie.sqlite");
    assert_eq!(config.database.sqlite.journal_mode, SqliteJournalMode::Wal);
    assert_eq!(config.database.sqlite.busy_timeout_ms, 5000);
    assert!(config.database.sqlite.foreign_keys);
    assert_eq!(config.migrations.ivfflat_lists, 100);
    assert_eq!(config.migrations.command_vector_dimensions, 128);
    assert_eq!(config.migrations.behavioral_vector_dimensions, 64);
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
database:
  url: "postgresql://cowrie@db.internal/cowrie"
  sqlite:
    journal_mode: delete
    busy_timeout_ms: 250
    foreign_keys: false
migrations:
  ivfflat_lists: 32
  command_vector_dimensions: 256
  behavioral_vector_dimensions: 16
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.database.url, "postgresql://cowrie@db.internal/cowrie");
    assert_eq!(
        config.database.sqlite.journal_mode,
        SqliteJournalMode::Delete
    );
    assert_eq!(config.database.sqlite.busy_timeout_ms, 250);
    assert!(!config.database.sqlite.foreign_keys);
    assert_eq!(config.migrations.ivfflat_lists, 32);
    assert_eq!(config.migrations.command_vector_dimensions, 256);
    assert_eq!(config.migrations.behavioral_vector_dimensions, 16);
    config.validate().unwrap();
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("database:\n  path: x.db\n");
    assert!(result.is_err());
}

#[test]
fn test_journal_mode_display() {
    assert_eq!(SqliteJournalMode::Wal.to_string(), "WAL");
    assert_eq!(SqliteJournalMode::Delete.to_string(), "DELETE");
    assert_eq!(SqliteJournalMode::Memory.to_string(), "MEMORY");
}

#[test]
fn test_validate_rejects_empty_url() {
    let mut config = Config::default();
    config.database.url = "   ".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_validate_rejects_unknown_scheme() {
    let mut config = Config::default();
    config.database.url = "mysql://localhost/cowrie".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Unsupported database.url"));
}

#[test]
fn test_validate_accepts_memory() {
    let mut config = Config::default();
    config.database.url = ":memory:".to_string();
    config.validate().unwrap();
}

#[test]
fn test_validate_vector_dimensions() {
    let mut config = Config::default();
    config.migrations.command_vector_dimensions = 2001;
    assert!(config.validate().is_err());

    config.migrations.command_vector_dimensions = 2000;
    config.validate().unwrap();

    config.migrations.behavioral_vector_dimensions = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_ivfflat_lists() {
    let mut config = Config::default();
    config.migrations.ivfflat_lists = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
#[serial]
fn test_load_from_dir_prefers_yml() {
    std::env::remove_var(DB_URL_ENV);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("cowrie-db.yml"),
        "database:\n  url: \"sqlite:///a.db\"\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("cowrie-db.yaml"),
        "database:\n  url: \"sqlite:///b.db\"\n",
    )
    .unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.database.url, "sqlite:///a.db");
}

#[test]
#[serial]
fn test_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cowrie-db.yml");
    std::fs::write(&path, "database:\n  url: \"sqlite:///file.db\"\n").unwrap();

    std::env::set_var(DB_URL_ENV, "postgresql://override/cowrie");
    let config = Config::load(&path);
    std::env::remove_var(DB_URL_ENV);

    assert_eq!(config.unwrap().database.url, "postgresql://override/cowrie");
}

#[test]
#[serial]
fn test_from_env_defaults() {
    std::env::remove_var(DB_URL_ENV);
    let config = Config::from_env().unwrap();
    assert_eq!(config.database.url, "sqlite:///cowrie.sqlite");
}

#[test]
fn test_with_database_url_validates() {
    let config = Config::default();
    assert!(config.clone().with_database_url("sqlite://:memory:").is_ok());
    assert!(config.with_database_url("").is_err());
}
