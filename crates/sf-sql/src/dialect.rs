//! SQL dialect abstraction

use sqlparser::ast::Statement;
use sqlparser::dialect::{
    Dialect, DuckDbDialect as SqlParserDuckDb, PostgreSqlDialect as SqlParserPostgres,
};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// Trait for SQL dialect implementations
///
/// Besides parsing and quoting, a dialect declares which parts of the
/// operation vocabulary its engine can express.
pub trait SqlDialect: Send + Sync {
    /// Get the underlying sqlparser dialect
    fn parser_dialect(&self) -> &dyn Dialect;

    /// Parse SQL into AST statements
    fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect(), sql).map_err(|e| {
            let msg = e.to_string();
            let (line, column) = parse_location_from_error(&msg);
            SqlError::ParseError {
                message: msg,
                line,
                column,
            }
        })
    }

    /// Quote an identifier for this dialect
    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// `ALTER TABLE ... ADD COLUMN` accepts NOT NULL and other constraints
    fn supports_add_column_constraints(&self) -> bool {
        true
    }

    /// Foreign keys can be added to or dropped from existing tables
    fn supports_alter_foreign_keys(&self) -> bool {
        true
    }

    /// Foreign keys may use `ON DELETE CASCADE` / `SET NULL`
    fn supports_cascading_foreign_keys(&self) -> bool {
        true
    }

    /// Indexes may carry a `WHERE` predicate
    fn supports_filtered_indexes(&self) -> bool {
        true
    }

    /// Indexes can be renamed in place
    fn supports_rename_index(&self) -> bool {
        true
    }

    /// The engine has roles and table privileges
    fn supports_grants(&self) -> bool {
        true
    }
}

/// Parse line and column from sqlparser error message.
///
/// sqlparser's `ParserError` is a simple string wrapper with no structured
/// location data, so we extract "Line: N, Column: M" from the error message text.
fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

/// DuckDB SQL dialect
pub struct DuckDbDialect {
    dialect: SqlParserDuckDb,
}

impl DuckDbDialect {
    /// Create a new DuckDB dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserDuckDb {},
        }
    }
}

impl Default for DuckDbDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for DuckDbDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }

    // DuckDB rejects constraints in ADD COLUMN and has no ALTER TABLE
    // ADD/DROP CONSTRAINT, partial indexes, ALTER INDEX or roles.

    fn supports_add_column_constraints(&self) -> bool {
        false
    }

    fn supports_alter_foreign_keys(&self) -> bool {
        false
    }

    fn supports_cascading_foreign_keys(&self) -> bool {
        false
    }

    fn supports_filtered_indexes(&self) -> bool {
        false
    }

    fn supports_rename_index(&self) -> bool {
        false
    }

    fn supports_grants(&self) -> bool {
        false
    }
}

/// PostgreSQL dialect
pub struct PostgresDialect {
    dialect: SqlParserPostgres,
}

impl PostgresDialect {
    /// Create a new PostgreSQL dialect
    pub fn new() -> Self {
        Self {
            dialect: SqlParserPostgres {},
        }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn parser_dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Build the dialect configured for a project
pub fn dialect_for(dialect: sf_core::Dialect) -> Box<dyn SqlDialect> {
    match dialect {
        sf_core::Dialect::DuckDb => Box::new(DuckDbDialect::new()),
        sf_core::Dialect::Postgres => Box::new(PostgresDialect::new()),
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
