//! SQLite database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, Database};
use crate::value::{Row, SqlValue};
use cw_core::SqliteConfig;
use cw_sql::DatabaseType;
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// SQLite database backend
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let backend = Self { conn };
        backend.configure(&SqliteConfig::default(), true)?;
        Ok(backend)
    }

    /// Create a new SQLite connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        Self::open(path, &SqliteConfig::default())
    }

    /// Open a file-backed SQLite connection with explicit settings
    pub fn open(path: &Path, settings: &SqliteConfig) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        let backend = Self { conn };
        backend.configure(settings, false)?;
        Ok(backend)
    }

    /// Open an in-memory SQLite connection with explicit settings
    pub fn open_in_memory(settings: &SqliteConfig) -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        let backend = Self { conn };
        backend.configure(settings, true)?;
        Ok(backend)
    }

    /// Borrow the underlying rusqlite connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn configure(&self, settings: &SqliteConfig, in_memory: bool) -> DbResult<()> {
        self.conn
            .busy_timeout(Duration::from_millis(settings.busy_timeout_ms))
            .map_err(|e| DbError::ConnectionError(format!("busy_timeout: {e}")))?;
        self.conn
            .pragma_update(None, "foreign_keys", settings.foreign_keys)
            .map_err(|e| DbError::ConnectionError(format!("foreign_keys: {e}")))?;
        if !in_memory {
            let mode: String = self
                .conn
                .pragma_update_and_check(
                    None,
                    "journal_mode",
                    settings.journal_mode.to_string(),
                    |row| row.get(0),
                )
                .map_err(|e| DbError::ConnectionError(format!("journal_mode: {e}")))?;
            log::debug!("SQLite journal_mode = {mode}");
        }
        Ok(())
    }
}

fn to_sqlite_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(*v),
        SqlValue::Real(v) => Value::Real(*v),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

fn from_sqlite_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(v) => SqlValue::Integer(v),
        ValueRef::Real(v) => SqlValue::Real(v),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

fn sqlite_error(sql: &str, err: rusqlite::Error) -> DbError {
    match DbError::from(err) {
        DbError::ExecutionError { message, source } => DbError::ExecutionError {
            message: format!("{message}: {sql}"),
            source,
        },
        other => other,
    }
}

impl Database for SqliteBackend {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let values = params.iter().map(to_sqlite_value);
        let affected = self
            .conn
            .execute(sql, rusqlite::params_from_iter(values))
            .map_err(|e| sqlite_error(sql, e))?;
        Ok(affected as u64)
    }

    fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| sqlite_error(sql, e))
    }

    fn query(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| sqlite_error(sql, e))?;
        let column_count = stmt.column_count();
        let values = params.iter().map(to_sqlite_value);
        let rows = stmt
            .query_map(rusqlite::params_from_iter(values), |row| {
                let mut cells = Vec::with_capacity(column_count);
                for idx in 0..column_count {
                    cells.push(from_sqlite_value(row.get_ref(idx)?));
                }
                Ok(Row::new(cells))
            })
            .map_err(|e| sqlite_error(sql, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| sqlite_error(sql, e))?;
        Ok(rows)
    }

    fn list_tables(&mut self) -> DbResult<Vec<String>> {
        let rows = self.query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[],
        )?;
        rows.iter().map(|r| r.get_string(0)).collect()
    }

    fn list_columns(&mut self, table: &str) -> DbResult<Vec<ColumnInfo>> {
        // table_xinfo (unlike table_info) includes generated columns and
        // reports them through the `hidden` classifier.
        let rows = self.query(
            "SELECT name, type, \"notnull\", hidden FROM pragma_table_xinfo(?1) ORDER BY cid",
            &[SqlValue::from(table)],
        )?;
        rows.iter()
            .map(|r| {
                Ok(ColumnInfo {
                    name: r.get_string(0)?,
                    data_type: r.get_opt_string(1)?.unwrap_or_default(),
                    nullable: r.get_i64(2)? == 0,
                    hidden: r.get_i64(3)?,
                })
            })
            .collect()
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin(&mut self) -> DbResult<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    fn commit(&mut self) -> DbResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
