use super::*;

#[test]
fn test_sqlite_parse() {
    let dialect = SqliteDialect::new();
    let stmts = dialect.parse("SELECT * FROM raw_events").unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_postgres_parse() {
    let dialect = PostgresDialect::new();
    let stmts = dialect
        .parse("SELECT payload->>'session' FROM raw_events")
        .unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_parse_empty() {
    let dialect = SqliteDialect::new();
    assert!(matches!(dialect.parse("  "), Err(SqlError::EmptySql)));
}

#[test]
fn test_quote_ident() {
    for dialect in [DatabaseType::Sqlite.dialect(), DatabaseType::Postgresql.dialect()] {
        assert_eq!(dialect.quote_ident("raw_events"), "\"raw_events\"");
        assert_eq!(dialect.quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}

#[test]
fn test_quote_literal() {
    let dialect = PostgresDialect::new();
    assert_eq!(dialect.quote_literal("it's"), "'it''s'");
    assert_eq!(SqliteDialect::new().quote_literal("$.eventid"), "'$.eventid'");
}

#[test]
fn test_placeholders() {
    assert_eq!(SqliteDialect::new().placeholder(2), "?2");
    assert_eq!(PostgresDialect::new().placeholder(2), "$2");
}

#[test]
fn test_database_type_names() {
    assert_eq!(DatabaseType::Sqlite.name(), "sqlite");
    assert_eq!(DatabaseType::Postgresql.name(), "postgresql");
    assert_eq!(DatabaseType::Postgresql.to_string(), "postgresql");
    assert_eq!(DatabaseType::Sqlite.dialect().name(), "sqlite");
    assert!(DatabaseType::Postgresql.is_postgres());
    assert!(!DatabaseType::Sqlite.is_postgres());
}

#[test]
fn test_database_type_from_str() {
    assert_eq!(
        "postgres".parse::<DatabaseType>().unwrap(),
        DatabaseType::Postgresql
    );
    assert_eq!(
        "PostgreSQL".parse::<DatabaseType>().unwrap(),
        DatabaseType::Postgresql
    );
    assert_eq!("sqlite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
    assert!(matches!(
        "mysql".parse::<DatabaseType>(),
        Err(SqlError::UnsupportedDatabase(_))
    ));
}

#[test]
fn test_column_types_differ_by_engine() {
    let sqlite = DatabaseType::Sqlite.dialect().column_types();
    let pg = DatabaseType::Postgresql.dialect().column_types();
    assert_eq!(sqlite.json, "TEXT");
    assert_eq!(pg.json, "JSONB");
    assert_eq!(sqlite.timestamp, "TIMESTAMP");
    assert_eq!(pg.timestamp, "TIMESTAMP WITH TIME ZONE");
    assert_eq!(sqlite.float, pg.float);
}

#[test]
fn test_parse_error_location() {
    let dialect = SqliteDialect::new();
    let result = dialect.parse("SELECT\nFROM raw_events");
    assert!(result.is_err());
    if let Err(SqlError::ParseError { line, message, .. }) = result {
        assert_eq!(line, 2, "Expected line 2 (message: {message})");
    }
}

#[test]
fn test_parse_location_extraction() {
    let (line, col) =
        super::parse_location_from_error("Expected: something at Line: 5, Column: 10");
    assert_eq!(line, 5);
    assert_eq!(col, 10);

    let (line, col) = super::parse_location_from_error("Some error without location");
    assert_eq!(line, 0);
    assert_eq!(col, 0);
}
