//! cw-db - Database abstraction layer for cowrie-db
//!
//! This crate provides the `Database` trait (the connection boundary the
//! migration engine is written against) and its SQLite and PostgreSQL
//! implementations, plus the `Engine` factory that opens them from
//! configuration.

pub mod engine;
pub mod error;
pub mod postgres;
pub mod sqlite;
pub mod traits;
pub mod value;

pub use engine::Engine;
pub use error::{DbError, DbResult};
pub use postgres::PostgresBackend;
pub use sqlite::SqliteBackend;
pub use traits::{with_transaction, ColumnInfo, Database};
pub use value::{Row, SqlValue};

pub use cw_sql::{DatabaseType, SqlDialect};
