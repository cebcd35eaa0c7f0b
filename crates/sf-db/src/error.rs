//! Error types for sf-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// A statement in a batch failed (D004)
    #[error("[D004] Statement {index} of {total} failed: {message}\n  SQL: {sql}")]
    StatementFailed {
        index: usize,
        total: usize,
        sql: String,
        message: String,
    },

    /// Transaction control failed (D005)
    #[error("[D005] Transaction error: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D006)
    #[error("[D006] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error has no structured catalog variants; match on the message
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl DbError {
    /// 1-based position of the failing statement, if known
    pub fn failed_statement(&self) -> Option<usize> {
        match self {
            DbError::StatementFailed { index, .. } => Some(*index),
            _ => None,
        }
    }
}
