//! SQL dialect abstraction

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use std::str::FromStr;

use crate::error::{SqlError, SqlResult};
use crate::json;

/// Database engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// SQLite (embedded, lightweight deployments)
    Sqlite,
    /// PostgreSQL (production deployments)
    Postgresql,
}

impl DatabaseType {
    /// Canonical engine name (`"sqlite"` or `"postgresql"`)
    pub fn name(self) -> &'static str {
        match self {
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Postgresql => "postgresql",
        }
    }

    /// The dialect implementation for this engine
    pub fn dialect(self) -> &'static dyn SqlDialect {
        match self {
            DatabaseType::Sqlite => &SQLITE,
            DatabaseType::Postgresql => &POSTGRES,
        }
    }

    /// True for PostgreSQL
    pub fn is_postgres(self) -> bool {
        self == DatabaseType::Postgresql
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatabaseType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            "postgresql" | "postgres" => Ok(DatabaseType::Postgresql),
            other => Err(SqlError::UnsupportedDatabase(other.to_string())),
        }
    }
}

/// DDL type names that differ per engine.
///
/// Types both engines have take their spelling from here. Types that exist
/// on one engine only (`vector(N)`, `UUID`) appear directly in the
/// PostgreSQL-only migrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypes {
    /// Auto-incrementing integer primary key column definition
    pub serial_pk: &'static str,
    /// Auto-incrementing 64-bit primary key column definition
    pub bigserial_pk: &'static str,
    /// JSON document column
    pub json: &'static str,
    /// Timestamp column
    pub timestamp: &'static str,
    /// Floating point column
    pub float: &'static str,
    /// Boolean column
    pub boolean: &'static str,
    /// 64-bit integer column
    pub bigint: &'static str,
    /// Empty JSON array literal of the JSON column type
    pub empty_json_array: &'static str,
    /// Empty JSON object literal of the JSON column type
    pub empty_json_object: &'static str,
}

const SQLITE_TYPES: ColumnTypes = ColumnTypes {
    serial_pk: "INTEGER PRIMARY KEY AUTOINCREMENT",
    bigserial_pk: "INTEGER PRIMARY KEY AUTOINCREMENT",
    json: "TEXT",
    timestamp: "TIMESTAMP",
    float: "REAL",
    boolean: "BOOLEAN",
    bigint: "INTEGER",
    empty_json_array: "'[]'",
    empty_json_object: "'{}'",
};

const POSTGRES_TYPES: ColumnTypes = ColumnTypes {
    serial_pk: "SERIAL PRIMARY KEY",
    bigserial_pk: "BIGSERIAL PRIMARY KEY",
    json: "JSONB",
    timestamp: "TIMESTAMP WITH TIME ZONE",
    float: "REAL",
    boolean: "BOOLEAN",
    bigint: "BIGINT",
    empty_json_array: "'[]'::jsonb",
    empty_json_object: "'{}'::jsonb",
};

/// Trait for SQL dialect implementations
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements. Used to check generated DDL against
    /// the engine's grammar.
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        if sql.trim().is_empty() {
            return Err(SqlError::EmptySql);
        }
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = parse_location_from_error(&message);
            SqlError::ParseError {
                message,
                line,
                column,
            }
        })
    }

    /// Quote an identifier for this dialect
    fn quote_ident(&self, ident: &str) -> String;

    /// Quote a string literal for this dialect
    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    /// Bind placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String;

    /// Get the dialect name
    fn name(&self) -> &'static str {
        self.database_type().name()
    }

    /// Engine family this dialect targets
    fn database_type(&self) -> DatabaseType;

    /// DDL type names for this engine
    fn column_types(&self) -> ColumnTypes;

    /// Expression extracting top-level `field` from a JSON column as text
    fn json_field(&self, column: &str, field: &str) -> SqlResult<String> {
        json::get_field(column, field, self.database_type())
    }

    /// Expression extracting a dot-separated path from a JSON column as text
    fn json_nested_field(&self, column: &str, dot_path: &str) -> SqlResult<String> {
        json::get_nested_field(column, dot_path, self.database_type())
    }
}

/// `(line, column)` of a sqlparser error, `(0, 0)` when the message has
/// none. The error type only carries text like `... at Line: 5, Column: 10`.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    match (number_after(msg, "Line: "), number_after(msg, "Column: ")) {
        (Some(line), Some(column)) => (line, column),
        _ => (0, 0),
    }
}

fn number_after(msg: &str, label: &str) -> Option<usize> {
    let rest = &msg[msg.find(label)? + label.len()..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

static SQLITE: SqliteDialect = SqliteDialect {
    dialect: SQLiteDialect {},
};

static POSTGRES: PostgresDialect = PostgresDialect {
    dialect: PostgreSqlDialect {},
};

/// SQLite SQL dialect
pub struct SqliteDialect {
    dialect: SQLiteDialect,
}

impl SqliteDialect {
    /// Create a new SQLite dialect
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SqliteDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("?{index}")
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn column_types(&self) -> ColumnTypes {
        SQLITE_TYPES
    }
}

/// PostgreSQL SQL dialect
pub struct PostgresDialect {
    dialect: PostgreSqlDialect,
}

impl PostgresDialect {
    /// Create a new PostgreSQL dialect
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgresql
    }

    fn column_types(&self) -> ColumnTypes {
        POSTGRES_TYPES
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
