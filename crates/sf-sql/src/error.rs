//! Error types for sf-sql

use thiserror::Error;

/// SQL rendering and parsing errors
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

    /// Unknown dialect name (S003)
    #[error("[S003] Unknown SQL dialect: {0}")]
    UnknownDialect(String),

    /// Operation cannot be expressed in this dialect (S004)
    #[error("[S004] {operation} is not supported by {dialect}: {reason}")]
    Unsupported {
        dialect: String,
        operation: String,
        reason: String,
    },

    /// Operation payload is inconsistent (S005)
    #[error("[S005] Invalid {operation}: {reason}")]
    InvalidOperation { operation: String, reason: String },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
