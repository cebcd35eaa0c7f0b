//! The history table recording applied migrations.
//!
//! One row per applied unit. Rows are written in the same transaction as
//! the unit's own statements, so a rolled-back unit leaves no record.

use crate::error::{LedgerError, LedgerResult};
use serde::Serialize;
use sf_core::{HistoryConfig, Migration};
use sf_db::Database;
use sf_sql::quote_string;

/// A row of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub id: String,
    pub name: String,
    pub checksum: String,
    /// RFC 3339 timestamp
    pub applied_at: String,
    pub execution_ms: u64,
    pub transactional: bool,
}

/// Reads and writes the history table.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    config: HistoryConfig,
}

impl HistoryStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// Unquoted `schema.table` name, for messages
    pub fn table_name(&self) -> String {
        self.config.qualified_name()
    }

    /// Schema holding the history table
    pub fn schema(&self) -> &str {
        &self.config.schema
    }

    fn quoted(&self) -> String {
        format!("\"{}\".\"{}\"", self.config.schema, self.config.table)
    }

    /// Create the schema and table if they do not exist.
    pub async fn ensure(&self, db: &dyn Database) -> LedgerResult<()> {
        db.create_schema_if_not_exists(&self.config.schema).await?;
        db.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 id             VARCHAR PRIMARY KEY,
                 name           VARCHAR NOT NULL,
                 checksum       VARCHAR NOT NULL,
                 applied_at     VARCHAR NOT NULL,
                 execution_ms   BIGINT NOT NULL,
                 transactional  BOOLEAN NOT NULL
             )",
            self.quoted()
        ))
        .await?;
        Ok(())
    }

    /// All recorded units ordered by id. Empty if the table does not exist yet.
    pub async fn applied(&self, db: &dyn Database) -> LedgerResult<Vec<AppliedMigration>> {
        if !db.relation_exists(&self.table_name()).await? {
            return Ok(Vec::new());
        }
        let rows = db
            .query_rows(&format!(
                "SELECT id, name, checksum, applied_at, execution_ms, transactional FROM {} ORDER BY id",
                self.quoted()
            ))
            .await?;

        rows.into_iter()
            .map(|row| {
                let text = |idx: usize| -> LedgerResult<String> {
                    row.get(idx).cloned().flatten().ok_or_else(|| {
                        self.invalid(format!("NULL in column {} of a history row", idx + 1))
                    })
                };
                let execution_ms = text(4)?
                    .parse::<u64>()
                    .map_err(|e| self.invalid(format!("execution_ms: {}", e)))?;
                Ok(AppliedMigration {
                    id: text(0)?,
                    name: text(1)?,
                    checksum: text(2)?,
                    applied_at: text(3)?,
                    execution_ms,
                    transactional: text(5)? == "true",
                })
            })
            .collect()
    }

    /// Statement recording `migration` as applied.
    pub fn insert_sql(&self, migration: &Migration, applied_at: &str) -> String {
        format!(
            "INSERT INTO {} (id, name, checksum, applied_at, execution_ms, transactional) VALUES ({}, {}, {}, {}, 0, {})",
            self.quoted(),
            quote_string(migration.id.as_str()),
            quote_string(migration.name()),
            quote_string(&migration.checksum()),
            quote_string(applied_at),
            if migration.transactional { "TRUE" } else { "FALSE" }
        )
    }

    /// Statement removing the record for `id`.
    pub fn delete_sql(&self, id: &str) -> String {
        format!("DELETE FROM {} WHERE id = {}", self.quoted(), quote_string(id))
    }

    /// Store the measured duration once the unit has committed.
    pub async fn record_duration(
        &self,
        db: &dyn Database,
        id: &str,
        execution_ms: u64,
    ) -> LedgerResult<()> {
        db.execute(&format!(
            "UPDATE {} SET execution_ms = {} WHERE id = {}",
            self.quoted(),
            execution_ms,
            quote_string(id)
        ))
        .await?;
        Ok(())
    }

    fn invalid(&self, message: String) -> LedgerError {
        LedgerError::HistoryInvalid {
            table: self.table_name(),
            message,
        }
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
