//! Error types for cw-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {message}")]
    ExecutionError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// Transaction management error (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),

    /// Unsupported database URL (D005)
    #[error("[D005] Unsupported database URL: {0}")]
    UnsupportedUrl(String),

    /// Value could not be converted (D006)
    #[error("[D006] Value conversion failed: {0}")]
    ConversionError(String),

    /// Query returned no rows where one was required (D007)
    #[error("[D007] Query returned no rows: {0}")]
    NoRows(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Build an execution error that keeps the driver error as its source.
    pub fn execution<E>(context: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DbError::ExecutionError {
            message: format!("{err}: {context}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        // rusqlite reports a missing table only through the message text.
        let msg = err.to_string();
        if msg.contains("no such table") {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError {
                message: msg,
                source: Some(Box::new(err)),
            }
        }
    }
}

impl From<postgres::Error> for DbError {
    fn from(err: postgres::Error) -> Self {
        let undefined_table = err
            .code()
            .is_some_and(|c| c == &postgres::error::SqlState::UNDEFINED_TABLE);
        let msg = match err.as_db_error() {
            Some(db) => db.message().to_string(),
            None => err.to_string(),
        };
        if undefined_table {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError {
                message: msg,
                source: Some(Box::new(err)),
            }
        }
    }
}
