//! Guarded statement execution.
//!
//! A guarded statement never propagates its error. Inside a transaction it
//! runs under a savepoint, so a failure undoes only that statement and the
//! rest of the migration run stays usable (PostgreSQL otherwise refuses every
//! later statement in an aborted transaction).

use cw_db::{Database, DbResult};

const GUARD_SAVEPOINT: &str = "cw_guarded_step";
const PROBE_SAVEPOINT: &str = "cw_probe";

/// How the caller treats a failed guarded statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Failure aborts the whole migration run
    Required,
    /// Failure is logged, counted, and the run continues
    BestEffort,
}

/// Execute exactly one statement, returning whether it succeeded.
///
/// Success is logged at info with `description`. On failure the error is
/// logged, the statement's work is rolled back, and `false` is returned.
pub fn execute_guarded(db: &mut dyn Database, sql: &str, description: &str) -> bool {
    run_guarded(db, sql, description).is_some()
}

/// Like [`execute_guarded`], returning the affected row count on success.
pub(crate) fn run_guarded(db: &mut dyn Database, sql: &str, description: &str) -> Option<u64> {
    let isolated = db.in_transaction();
    // Without a savepoint a failure would abort the enclosing transaction,
    // so the statement is not attempted.
    if isolated && !savepoint_or_log(db, GUARD_SAVEPOINT) {
        log::warn!("{description} skipped: no savepoint");
        return None;
    }

    match db.execute(sql, &[]) {
        Ok(affected) => {
            if isolated {
                if let Err(e) = db.release_savepoint(GUARD_SAVEPOINT) {
                    log::warn!("Failed to release savepoint after '{description}': {e}");
                }
            }
            log::info!("{description}");
            Some(affected)
        }
        Err(e) => {
            log::warn!("{description} failed: {e}");
            if isolated {
                undo_savepoint(db, GUARD_SAVEPOINT);
            }
            None
        }
    }
}

/// Run a read-only catalog probe, isolated like a guarded statement.
///
/// The probe's own error is returned to the caller, which decides the
/// conservative default.
pub(crate) fn probe<T>(
    db: &mut dyn Database,
    body: impl FnOnce(&mut dyn Database) -> DbResult<T>,
) -> DbResult<T> {
    if !db.in_transaction() {
        return body(db);
    }
    db.savepoint(PROBE_SAVEPOINT)?;
    let result = body(db);
    match &result {
        Ok(_) => db.release_savepoint(PROBE_SAVEPOINT)?,
        Err(_) => undo_savepoint(db, PROBE_SAVEPOINT),
    }
    result
}

fn savepoint_or_log(db: &mut dyn Database, name: &str) -> bool {
    match db.savepoint(name) {
        Ok(()) => true,
        Err(e) => {
            log::error!("Could not create savepoint {name}: {e}");
            false
        }
    }
}

fn undo_savepoint(db: &mut dyn Database, name: &str) {
    if let Err(e) = db.rollback_to_savepoint(name) {
        log::error!("Rollback to savepoint {name} failed: {e}");
        return;
    }
    if let Err(e) = db.release_savepoint(name) {
        log::error!("Release of savepoint {name} failed: {e}");
    }
}

#[cfg(test)]
#[path = "guarded_test.rs"]
mod tests;
