//! Migration context: the connection plus idempotent `ensure_*` primitives.
//!
//! Every primitive checks the catalog first and returns `Ok(false)` when the
//! object already exists, so a version function is just a list of ensures.
//! Each successful structural change is counted; failed best-effort steps
//! are counted separately.

use crate::error::{MigrateError, MigrateResult};
use crate::features::FeatureReport;
use crate::guarded::run_guarded;
use crate::introspect;
use crate::migration::MigrationOptions;
use cw_db::{Database, DatabaseType};
use cw_sql::{ColumnTypes, SqlDialect};

pub use crate::guarded::StepKind;

/// State shared by every version function during one run.
pub struct MigrationContext<'a> {
    db: &'a mut dyn Database,
    options: MigrationOptions,
    features: FeatureReport,
    structural_changes: u32,
    advisory_failures: u32,
}

impl<'a> MigrationContext<'a> {
    pub fn new(db: &'a mut dyn Database, options: MigrationOptions, features: FeatureReport) -> Self {
        Self {
            db,
            options,
            features,
            structural_changes: 0,
            advisory_failures: 0,
        }
    }

    /// The underlying connection.
    pub fn db(&mut self) -> &mut dyn Database {
        &mut *self.db
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db.db_type()
    }

    pub fn is_postgres(&self) -> bool {
        self.db_type().is_postgres()
    }

    pub fn dialect(&self) -> &'static dyn SqlDialect {
        self.db.dialect()
    }

    /// Per-engine DDL type names
    pub fn types(&self) -> ColumnTypes {
        self.dialect().column_types()
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Capabilities detected at the start of the run
    pub fn features(&self) -> &FeatureReport {
        &self.features
    }

    pub fn structural_changes(&self) -> u32 {
        self.structural_changes
    }

    pub fn advisory_failures(&self) -> u32 {
        self.advisory_failures
    }

    /// Run one guarded statement and apply the step-kind policy.
    pub fn step(&mut self, kind: StepKind, sql: &str, description: &str) -> MigrateResult<bool> {
        Ok(self.step_counted(kind, sql, description)?.is_some())
    }

    fn step_counted(
        &mut self,
        kind: StepKind,
        sql: &str,
        description: &str,
    ) -> MigrateResult<Option<u64>> {
        match run_guarded(&mut *self.db, sql, description) {
            Some(affected) => Ok(Some(affected)),
            None => match kind {
                StepKind::Required => Err(MigrateError::RequiredStep {
                    description: description.to_string(),
                }),
                StepKind::BestEffort => {
                    self.advisory_failures += 1;
                    Ok(None)
                }
            },
        }
    }

    fn structural(&mut self, kind: StepKind, sql: &str, description: &str) -> MigrateResult<bool> {
        let changed = self.step(kind, sql, description)?;
        if changed {
            self.structural_changes += 1;
        }
        Ok(changed)
    }

    /// Fail with [`MigrateError::MissingPrerequisite`] unless `table` exists.
    pub fn require_table(&mut self, table: &str) -> MigrateResult<()> {
        if introspect::table_exists(&mut *self.db, table) {
            Ok(())
        } else {
            Err(MigrateError::MissingPrerequisite(format!("table {table} does not exist")))
        }
    }

    pub fn table_exists(&mut self, table: &str) -> bool {
        introspect::table_exists(&mut *self.db, table)
    }

    pub fn column_exists(&mut self, table: &str, column: &str) -> bool {
        introspect::column_exists(&mut *self.db, table, column)
    }

    pub fn is_generated_column(&mut self, table: &str, column: &str) -> bool {
        introspect::is_generated_column(&mut *self.db, table, column)
    }

    /// Create `table` with `create_sql` unless it exists.
    pub fn ensure_table(&mut self, kind: StepKind, table: &str, create_sql: &str) -> MigrateResult<bool> {
        if self.table_exists(table) {
            log::debug!("Table {table} already exists");
            return Ok(false);
        }
        self.structural(kind, create_sql, &format!("Created table {table}"))
    }

    /// Add `table.column` declared as `definition` unless a column of that
    /// name (ordinary or generated) already exists.
    pub fn ensure_column(
        &mut self,
        kind: StepKind,
        table: &str,
        column: &str,
        definition: &str,
    ) -> MigrateResult<bool> {
        if self.column_exists(table, column) {
            log::debug!("Column {table}.{column} already exists");
            return Ok(false);
        }
        let sql = format!(
            "ALTER TABLE {table} ADD COLUMN {} {definition}",
            self.dialect().quote_ident(column)
        );
        self.structural(kind, &sql, &format!("Added column {table}.{column}"))
    }

    /// Create an index with `create_sql` unless `name` exists.
    pub fn ensure_index(&mut self, kind: StepKind, name: &str, create_sql: &str) -> MigrateResult<bool> {
        if introspect::index_exists(&mut *self.db, name) {
            log::debug!("Index {name} already exists");
            return Ok(false);
        }
        self.structural(kind, create_sql, &format!("Created index {name}"))
    }

    /// `CREATE INDEX IF NOT EXISTS name ON table (columns)`
    pub fn ensure_simple_index(
        &mut self,
        kind: StepKind,
        name: &str,
        table: &str,
        columns: &str,
    ) -> MigrateResult<bool> {
        let sql = format!("CREATE INDEX IF NOT EXISTS {name} ON {table} ({columns})");
        self.ensure_index(kind, name, &sql)
    }

    /// Add a named CHECK constraint (PostgreSQL only; its DDL has no
    /// `ADD CONSTRAINT IF NOT EXISTS`, so the catalog is probed first).
    pub fn ensure_check_constraint(
        &mut self,
        kind: StepKind,
        table: &str,
        name: &str,
        expression: &str,
    ) -> MigrateResult<bool> {
        self.require_postgres("named CHECK constraints")?;
        if introspect::constraint_exists(&mut *self.db, table, name) {
            log::debug!("Constraint {name} already exists on {table}");
            return Ok(false);
        }
        let sql = format!("ALTER TABLE {table} ADD CONSTRAINT {name} CHECK ({expression})");
        self.structural(kind, &sql, &format!("Added CHECK constraint {name} on {table}"))
    }

    /// Add a named UNIQUE constraint (PostgreSQL only).
    pub fn ensure_unique_constraint(
        &mut self,
        kind: StepKind,
        table: &str,
        name: &str,
        columns: &str,
    ) -> MigrateResult<bool> {
        self.require_postgres("named UNIQUE constraints")?;
        if introspect::constraint_exists(&mut *self.db, table, name) {
            log::debug!("Constraint {name} already exists on {table}");
            return Ok(false);
        }
        let sql = format!("ALTER TABLE {table} ADD CONSTRAINT {name} UNIQUE ({columns})");
        self.structural(kind, &sql, &format!("Added UNIQUE constraint {name} on {table}"))
    }

    /// Create a view unless `name` exists.
    pub fn ensure_view(&mut self, kind: StepKind, name: &str, create_sql: &str) -> MigrateResult<bool> {
        if introspect::view_exists(&mut *self.db, name) {
            log::debug!("View {name} already exists");
            return Ok(false);
        }
        self.structural(kind, create_sql, &format!("Created view {name}"))
    }

    /// Create a (PostgreSQL) function unless one of that name exists.
    pub fn ensure_function(&mut self, kind: StepKind, name: &str, create_sql: &str) -> MigrateResult<bool> {
        self.require_postgres("stored functions")?;
        if introspect::function_exists(&mut *self.db, name) {
            log::debug!("Function {name} already exists");
            return Ok(false);
        }
        self.structural(kind, create_sql, &format!("Created function {name}"))
    }

    /// Attach a trigger unless `name` is already on `table`.
    pub fn ensure_trigger(
        &mut self,
        kind: StepKind,
        table: &str,
        name: &str,
        create_sql: &str,
    ) -> MigrateResult<bool> {
        if introspect::trigger_exists(&mut *self.db, table, name) {
            log::debug!("Trigger {name} already exists on {table}");
            return Ok(false);
        }
        self.structural(kind, create_sql, &format!("Created trigger {name} on {table}"))
    }

    /// Run a structural statement with no existence check (downgrades,
    /// type conversions already gated by the caller).
    pub fn alter(&mut self, kind: StepKind, sql: &str, description: &str) -> MigrateResult<bool> {
        self.structural(kind, sql, description)
    }

    /// Best-effort data update; returns the affected row count, `None` on
    /// failure. Not counted as a structural change.
    pub fn backfill(&mut self, sql: &str, description: &str) -> MigrateResult<Option<u64>> {
        self.step_counted(StepKind::BestEffort, sql, description)
    }

    /// Fill NULLs of `table.column` from `expression`, unless the column is
    /// generated by the engine (writes to it are forbidden).
    pub fn backfill_column(
        &mut self,
        table: &str,
        column: &str,
        expression: &str,
    ) -> MigrateResult<Option<u64>> {
        if !self.column_exists(table, column) {
            log::warn!("Skipping backfill of {table}.{column}: column missing");
            return Ok(None);
        }
        if self.is_generated_column(table, column) {
            log::info!("Skipping backfill of {table}.{column}: generated column");
            return Ok(None);
        }
        let sql = format!("UPDATE {table} SET {column} = {expression} WHERE {column} IS NULL");
        self.backfill(&sql, &format!("Backfilled {table}.{column}"))
    }

    /// Log a feature that does not apply to this engine.
    pub fn skip(&self, what: &str, reason: &str) {
        log::info!("Skipping {what}: {reason}");
    }

    fn require_postgres(&self, operation: &str) -> MigrateResult<()> {
        if self.is_postgres() {
            Ok(())
        } else {
            Err(MigrateError::UnsupportedDialect {
                operation: operation.to_string(),
                dialect: self.db_type().to_string(),
            })
        }
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
