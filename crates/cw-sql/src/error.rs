//! Error types for cw-sql

use thiserror::Error;

/// SQL dialect errors
#[derive(Error, Debug)]
pub enum SqlError {
    /// SQL parse error (S001)
    #[error("[S001] SQL parse error at line {line}, column {column}: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL (S002)
    #[error("[S002] SQL is empty")]
    EmptySql,

    /// Unknown database type name (S003)
    #[error("[S003] Unsupported database type: {0}")]
    UnsupportedDatabase(String),

    /// Invalid JSON path (S004)
    #[error("[S004] Invalid JSON path '{path}': {reason}")]
    InvalidJsonPath { path: String, reason: String },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
