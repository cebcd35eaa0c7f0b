//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use sf_core::snapshot::SchemaSnapshot;

/// A result row; `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// Database abstraction trait for Schemaflow
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run all statements atomically: either every statement commits or
    /// none does. No other call can interleave with the transaction.
    async fn execute_in_transaction(&self, statements: &[String]) -> DbResult<()>;

    /// Run statements one by one with autocommit, stopping at the first
    /// failure. Earlier statements stay applied.
    async fn execute_each(&self, statements: &[String]) -> DbResult<()>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Execute a query and return every row as text
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Capture tables, columns, indexes and row digests of every user
    /// table outside `exclude_schemas`
    async fn capture_snapshot(&self, exclude_schemas: &[&str]) -> DbResult<SchemaSnapshot>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
