//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{Database, Row};
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use sf_core::checksum::compute_lines_checksum;
use sf_core::snapshot::{
    ColumnSnapshot, ConstraintSnapshot, IndexSnapshot, SchemaSnapshot, TableSnapshot,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Schemas that belong to the engine, never to the user
const SYSTEM_SCHEMAS: &[&str] = &["information_schema", "pg_catalog"];

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::ConnectionError(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn execute_in_transaction_sync(&self, statements: &[String]) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        if let Err(err) = run_statements(&conn, statements) {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                log::warn!("ROLLBACK failed: {}", rollback_err);
            }
            return Err(err);
        }

        if let Err(commit_err) = conn.execute_batch("COMMIT") {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(DbError::TransactionError(format!(
                "COMMIT failed: {commit_err}"
            )));
        }
        Ok(())
    }

    fn execute_each_sync(&self, statements: &[String]) -> DbResult<()> {
        let conn = self.lock()?;
        run_statements(&conn, statements)
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({})", sql), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let (schema, table) = split_qualified(name);
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
            literal(schema),
            literal(table)
        );
        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count > 0)
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        collect_rows(&conn, sql)
    }

    fn capture_snapshot_sync(&self, exclude_schemas: &[&str]) -> DbResult<SchemaSnapshot> {
        let conn = self.lock()?;
        let excluded: Vec<String> = SYSTEM_SCHEMAS
            .iter()
            .chain(exclude_schemas)
            .map(|s| literal(s))
            .collect();

        let tables = collect_rows(
            &conn,
            &format!(
                "SELECT table_schema, table_name FROM information_schema.tables \
                 WHERE table_type = 'BASE TABLE' AND table_schema NOT IN ({}) \
                 ORDER BY table_schema, table_name",
                excluded.join(", ")
            ),
        )?;

        let mut snapshot = SchemaSnapshot::default();
        for row in tables {
            let (Some(schema), Some(table)) = (cell(&row, 0), cell(&row, 1)) else {
                continue;
            };
            let captured = capture_table(&conn, schema, table)?;
            snapshot
                .tables
                .insert(format!("{}.{}", schema, table), captured);
        }
        log::debug!("Captured snapshot of {} tables", snapshot.tables.len());
        Ok(snapshot)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_in_transaction(&self, statements: &[String]) -> DbResult<()> {
        self.execute_in_transaction_sync(statements)
    }

    async fn execute_each(&self, statements: &[String]) -> DbResult<()> {
        self.execute_each_sync(statements)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Row>> {
        self.query_rows_sync(sql)
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", ident(schema));
        self.execute_batch_sync(&sql)
    }

    async fn capture_snapshot(&self, exclude_schemas: &[&str]) -> DbResult<SchemaSnapshot> {
        self.capture_snapshot_sync(exclude_schemas)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

/// Run statements in order, reporting the 1-based position of a failure.
fn run_statements(conn: &Connection, statements: &[String]) -> DbResult<()> {
    let total = statements.len();
    for (i, sql) in statements.iter().enumerate() {
        log::debug!("Executing statement {}/{}: {}", i + 1, total, sql);
        conn.execute_batch(sql)
            .map_err(|e| DbError::StatementFailed {
                index: i + 1,
                total,
                sql: sql.clone(),
                message: e.to_string(),
            })?;
    }
    Ok(())
}

fn capture_table(conn: &Connection, schema: &str, table: &str) -> DbResult<TableSnapshot> {
    let columns = collect_rows(
        conn,
        &format!(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} \
             ORDER BY ordinal_position",
            literal(schema),
            literal(table)
        ),
    )?
    .into_iter()
    .map(|row| ColumnSnapshot {
        name: cell(&row, 0).unwrap_or_default().to_string(),
        data_type: cell(&row, 1).unwrap_or_default().to_string(),
        nullable: cell(&row, 2) != Some("NO"),
        default: cell(&row, 3).map(str::to_string),
    })
    .collect();

    let indexes: BTreeMap<String, IndexSnapshot> = collect_rows(
        conn,
        &format!(
            "SELECT index_name, is_unique, sql FROM duckdb_indexes() \
             WHERE schema_name = {} AND table_name = {} \
             ORDER BY index_name",
            literal(schema),
            literal(table)
        ),
    )?
    .into_iter()
    .filter_map(|row| {
        let name = cell(&row, 0)?.to_string();
        Some((
            name,
            IndexSnapshot {
                unique: cell(&row, 1) == Some("true"),
                sql: cell(&row, 2).map(str::to_string),
            },
        ))
    })
    .collect();

    let mut constraints: Vec<ConstraintSnapshot> = collect_rows(
        conn,
        &format!(
            "SELECT constraint_type, array_to_string(constraint_column_names, ','), \
             constraint_text FROM duckdb_constraints() \
             WHERE schema_name = {} AND table_name = {} \
             AND constraint_type <> 'NOT NULL'",
            literal(schema),
            literal(table)
        ),
    )?
    .into_iter()
    .map(|row| ConstraintSnapshot {
        kind: cell(&row, 0).unwrap_or_default().to_string(),
        columns: cell(&row, 1)
            .filter(|c| !c.is_empty())
            .map(|c| c.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        text: cell(&row, 2).unwrap_or_default().to_string(),
    })
    .collect();
    constraints.sort();

    let rows = collect_rows(
        conn,
        &format!("SELECT * FROM {}.{}", ident(schema), ident(table)),
    )?;
    let mut lines: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| v.as_deref().unwrap_or("\\N"))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect();
    lines.sort();

    Ok(TableSnapshot {
        columns,
        indexes,
        constraints,
        row_count: lines.len() as u64,
        data_checksum: compute_lines_checksum(lines.iter().map(String::as_str)),
    })
}

/// Execute a query and read every cell as text.
///
/// DuckDB panics on `stmt.column_count()` before execution, so the count is
/// read from each row's statement while mapping.
fn collect_rows(conn: &Connection, sql: &str) -> DbResult<Vec<Row>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?;
    let rows = stmt
        .query_map([], |row| {
            let col_count = row.as_ref().column_count();
            (0..col_count)
                .map(|i| row.get::<_, Value>(i).map(value_to_text))
                .collect::<Result<Row, _>>()
        })
        .map_err(|e| DbError::ExecutionError(format!("{}: {}", e, sql)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::ExecutionError(format!("row error: {}", e)))?;
    Ok(rows)
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(n) => Some(n.to_string()),
        Value::SmallInt(n) => Some(n.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::BigInt(n) => Some(n.to_string()),
        Value::HugeInt(n) => Some(n.to_string()),
        Value::UTinyInt(n) => Some(n.to_string()),
        Value::USmallInt(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::UBigInt(n) => Some(n.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        other => Some(format!("{:?}", other)),
    }
}

fn cell(row: &Row, idx: usize) -> Option<&str> {
    row.get(idx).and_then(|v| v.as_deref())
}

fn split_qualified(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((schema, table)) => (schema, table),
        None => ("main", name),
    }
}

fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
