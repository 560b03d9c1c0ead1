//! Schema version ledger stored in `schema_state`.
//!
//! Both operations run on the caller's connection and inside whatever
//! transaction it has open; the ledger has no commit boundary of its own.

use crate::error::MigrateResult;
use crate::guarded::probe;
use cw_db::{Database, SqlValue};

/// Ledger table name.
pub const LEDGER_TABLE: &str = "schema_state";

/// Key holding the integer schema version.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Current schema version, 0 when the ledger is missing, empty, or holds
/// something that is not an integer.
pub fn get_version(db: &mut dyn Database) -> i32 {
    let p1 = db.dialect().placeholder(1);
    let sql = format!("SELECT value FROM {LEDGER_TABLE} WHERE key = {p1}");
    let row = match probe(db, |db| db.query_opt(&sql, &[SqlValue::from(SCHEMA_VERSION_KEY)])) {
        Ok(row) => row,
        Err(e) => {
            log::debug!("Schema version unreadable, treating as 0: {e}");
            return 0;
        }
    };
    row.and_then(|r| r.get_opt_string(0).ok().flatten())
        .and_then(|v| v.trim().parse::<i32>().ok())
        .unwrap_or(0)
}

/// Record `version`: UPDATE the existing row, INSERT only if none changed.
pub fn set_version(db: &mut dyn Database, version: i32) -> MigrateResult<()> {
    let dialect = db.dialect();
    let (p1, p2) = (dialect.placeholder(1), dialect.placeholder(2));
    let params = [
        SqlValue::from(version.to_string()),
        SqlValue::from(SCHEMA_VERSION_KEY),
    ];

    let updated = db.execute(
        &format!("UPDATE {LEDGER_TABLE} SET value = {p1} WHERE key = {p2}"),
        &params,
    )?;
    if updated == 0 {
        db.execute(
            &format!("INSERT INTO {LEDGER_TABLE} (value, key) VALUES ({p1}, {p2})"),
            &params,
        )?;
    }
    log::debug!("Schema version set to {version}");
    Ok(())
}
