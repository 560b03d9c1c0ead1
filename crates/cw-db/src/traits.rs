//! Database trait definition

use crate::error::{DbError, DbResult};
use crate::value::{Row, SqlValue};
use cw_sql::{DatabaseType, SqlDialect};

/// Column metadata reported by catalog introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared type as reported by the engine
    pub data_type: String,
    /// Whether NULL is allowed
    pub nullable: bool,
    /// SQLite `table_xinfo` hidden classifier: 0 normal, 1 hidden
    /// (virtual table), 2 virtual generated, 3 stored generated.
    /// Always 0 on PostgreSQL.
    pub hidden: i64,
}

impl ColumnInfo {
    /// True when the engine computes this column and forbids writes to it.
    pub fn is_generated(&self) -> bool {
        matches!(self.hidden, 2 | 3)
    }
}

/// Database abstraction trait for cowrie-db
///
/// One implementation wraps exactly one connection; every call runs on it,
/// so a transaction opened with [`Database::begin`] covers every later call
/// until [`Database::commit`] or [`Database::rollback`].
pub trait Database: Send {
    /// Engine family of this connection
    fn db_type(&self) -> DatabaseType;

    /// Execute one statement, returns affected rows
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64>;

    /// Execute multiple SQL statements (no parameters)
    fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// Execute a query and collect every row
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Names of the base tables visible to this connection
    fn list_tables(&mut self) -> DbResult<Vec<String>>;

    /// Columns of `table`; empty when the table does not exist
    fn list_columns(&mut self, table: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Whether an explicit transaction is open
    fn in_transaction(&self) -> bool;

    /// Open a transaction
    fn begin(&mut self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&mut self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&mut self) -> DbResult<()>;

    /// Dialect helpers for this connection's engine
    fn dialect(&self) -> &'static dyn SqlDialect {
        self.db_type().dialect()
    }

    /// Create a savepoint inside the open transaction
    fn savepoint(&mut self, name: &str) -> DbResult<()> {
        self.execute_batch(&format!("SAVEPOINT {name}"))
    }

    /// Release (keep the work of) a savepoint
    fn release_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.execute_batch(&format!("RELEASE SAVEPOINT {name}"))
    }

    /// Undo everything since a savepoint; the savepoint stays defined
    fn rollback_to_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.execute_batch(&format!("ROLLBACK TO SAVEPOINT {name}"))
    }

    /// First row of a query, if any
    fn query_opt(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// First cell of the first row; errors when the query returns no rows
    fn query_scalar(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<SqlValue> {
        let row = self
            .query_opt(sql, params)?
            .ok_or_else(|| DbError::NoRows(sql.to_string()))?;
        Ok(row.get(0)?.clone())
    }
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
pub fn with_transaction<T, E, F>(db: &mut dyn Database, body: F) -> Result<T, E>
where
    F: FnOnce(&mut dyn Database) -> Result<T, E>,
    E: From<DbError>,
{
    db.begin()?;

    let result = body(db);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = db.commit() {
                if let Err(rollback_err) = db.rollback() {
                    log::error!("ROLLBACK after failed COMMIT failed: {rollback_err}");
                }
                return Err(DbError::TransactionError(format!("COMMIT failed: {commit_err}")).into());
            }
        }
        Err(_) => {
            if let Err(rollback_err) = db.rollback() {
                log::error!("ROLLBACK failed: {rollback_err}");
            }
        }
    }
    result
}
