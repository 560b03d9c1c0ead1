//! Catalog existence checks.
//!
//! Every check answers `false` when the catalog query itself fails, so the
//! caller falls through to its (idempotent) create statement instead of
//! silently skipping work.

use crate::guarded::probe;
use cw_db::{ColumnInfo, Database, DatabaseType, SqlValue};

/// Whether a base table named `name` exists.
pub fn table_exists(db: &mut dyn Database, name: &str) -> bool {
    match probe(db, |db| db.list_tables()) {
        Ok(tables) => tables.iter().any(|t| t == name),
        Err(e) => {
            log::debug!("table_exists({name}) probe failed: {e}");
            false
        }
    }
}

/// Whether `table.column` exists; `false` when the table is missing.
pub fn column_exists(db: &mut dyn Database, table: &str, column: &str) -> bool {
    find_column(db, table, column).is_some()
}

/// Whether `table.column` is a SQLite generated column.
///
/// Always `false` on other engines, without querying.
pub fn is_generated_column(db: &mut dyn Database, table: &str, column: &str) -> bool {
    if db.db_type() != DatabaseType::Sqlite {
        return false;
    }
    find_column(db, table, column).is_some_and(|c| c.is_generated())
}

/// Declared type of `table.column` as reported by the catalog.
pub fn column_type(db: &mut dyn Database, table: &str, column: &str) -> Option<String> {
    find_column(db, table, column).map(|c| c.data_type)
}

fn find_column(db: &mut dyn Database, table: &str, column: &str) -> Option<ColumnInfo> {
    match probe(db, |db| db.list_columns(table)) {
        Ok(columns) => columns.into_iter().find(|c| c.name == column),
        Err(e) => {
            log::debug!("column probe for {table}.{column} failed: {e}");
            None
        }
    }
}

/// Whether an index named `name` exists.
pub fn index_exists(db: &mut dyn Database, name: &str) -> bool {
    let sql = match db.db_type() {
        DatabaseType::Sqlite => "SELECT 1 FROM sqlite_master WHERE type = 'index' AND name = ?1",
        DatabaseType::Postgresql => {
            "SELECT 1 FROM pg_indexes WHERE schemaname = current_schema() AND indexname = $1::text"
        }
    };
    catalog_has_row(db, sql, &[SqlValue::from(name)], "index", name)
}

/// Whether a view named `name` exists.
pub fn view_exists(db: &mut dyn Database, name: &str) -> bool {
    let sql = match db.db_type() {
        DatabaseType::Sqlite => "SELECT 1 FROM sqlite_master WHERE type = 'view' AND name = ?1",
        DatabaseType::Postgresql => {
            "SELECT 1 FROM information_schema.views \
             WHERE table_schema = current_schema() AND table_name = $1::text"
        }
    };
    catalog_has_row(db, sql, &[SqlValue::from(name)], "view", name)
}

/// Whether a named table constraint exists (PostgreSQL catalog).
///
/// SQLite has no named constraints outside `CREATE TABLE`, so this is
/// always `false` there.
pub fn constraint_exists(db: &mut dyn Database, table: &str, name: &str) -> bool {
    if db.db_type() != DatabaseType::Postgresql {
        return false;
    }
    catalog_has_row(
        db,
        "SELECT 1 FROM information_schema.table_constraints \
         WHERE table_schema = current_schema() AND table_name = $1::text \
         AND constraint_name = $2::text",
        &[SqlValue::from(table), SqlValue::from(name)],
        "constraint",
        name,
    )
}

/// Whether trigger `name` is attached to `table`.
pub fn trigger_exists(db: &mut dyn Database, table: &str, name: &str) -> bool {
    let (sql, params) = match db.db_type() {
        DatabaseType::Sqlite => (
            "SELECT 1 FROM sqlite_master WHERE type = 'trigger' AND tbl_name = ?1 AND name = ?2",
            vec![SqlValue::from(table), SqlValue::from(name)],
        ),
        DatabaseType::Postgresql => (
            "SELECT 1 FROM information_schema.triggers \
             WHERE trigger_schema = current_schema() AND event_object_table = $1::text \
             AND trigger_name = $2::text",
            vec![SqlValue::from(table), SqlValue::from(name)],
        ),
    };
    catalog_has_row(db, sql, &params, "trigger", name)
}

/// Whether a function named `name` exists in the current schema (PostgreSQL).
pub fn function_exists(db: &mut dyn Database, name: &str) -> bool {
    if db.db_type() != DatabaseType::Postgresql {
        return false;
    }
    catalog_has_row(
        db,
        "SELECT 1 FROM pg_proc p JOIN pg_namespace n ON n.oid = p.pronamespace \
         WHERE n.nspname = current_schema() AND p.proname = $1::text",
        &[SqlValue::from(name)],
        "function",
        name,
    )
}

fn catalog_has_row(
    db: &mut dyn Database,
    sql: &str,
    params: &[SqlValue],
    kind: &str,
    name: &str,
) -> bool {
    match probe(db, |db| db.query_opt(sql, params)) {
        Ok(row) => row.is_some(),
        Err(e) => {
            log::debug!("{kind} probe for {name} failed: {e}");
            false
        }
    }
}

#[cfg(test)]
#[path = "introspect_test.rs"]
mod tests;
