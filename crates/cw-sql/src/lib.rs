//! cw-sql - SQL dialect layer for cowrie-db
//!
//! This crate centralises everything that differs between SQLite and
//! PostgreSQL at the SQL-text level: identifier and literal quoting, bind
//! placeholders, DDL column types, and JSON field extraction. It performs no
//! I/O.

pub mod dialect;
pub mod error;
pub mod json;

pub use dialect::{ColumnTypes, DatabaseType, PostgresDialect, SqlDialect, SqliteDialect};
pub use error::{SqlError, SqlResult};
pub use json::{get_field, get_nested_field};
