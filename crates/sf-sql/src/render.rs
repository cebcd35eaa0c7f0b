//! Render [`Operation`]s to dialect SQL.
//!
//! This is the single interpreter behind every migration unit: a unit's
//! operation list renders to an ordered list of statements, which the
//! backend runs inside one transaction.

use crate::dialect::{dialect_for, SqlDialect};
use crate::error::{SqlError, SqlResult};
use sf_core::operation::{
    AddColumn, AddForeignKey, AlterColumn, ColumnDef, CreateIndex, CreateTable, DefaultChange,
    DeleteRows, InsertRows, Permission, ReferentialAction, UpdateRows,
};
use sf_core::{Direction, Migration, Operation, Value};
use std::collections::BTreeMap;

/// Result of rendering a single operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Statements to execute, in order (may be empty)
    Statements(Vec<String>),
    /// The operation has no meaning on this engine
    Skipped(String),
}

/// Result of rendering an operation list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderPlan {
    /// Statements to execute, in order
    pub statements: Vec<String>,
    /// Operations skipped on this engine, with the reason
    pub skipped: Vec<String>,
}

/// Renders operations for one dialect
pub struct SqlRenderer {
    dialect: Box<dyn SqlDialect>,
}

impl SqlRenderer {
    /// Create a renderer for a dialect
    pub fn new(dialect: Box<dyn SqlDialect>) -> Self {
        Self { dialect }
    }

    /// Create a renderer for a configured dialect
    pub fn for_dialect(dialect: sf_core::Dialect) -> Self {
        Self::new(dialect_for(dialect))
    }

    /// Name of the target dialect
    pub fn dialect_name(&self) -> &'static str {
        self.dialect.name()
    }

    /// Render one direction of a migration unit
    pub fn render_migration(
        &self,
        migration: &Migration,
        direction: Direction,
    ) -> SqlResult<RenderPlan> {
        let plan = self.render_all(migration.operations(direction))?;
        log::debug!(
            "Rendered {} ({}) for {}: {} statements, {} skipped",
            migration.id,
            direction,
            self.dialect.name(),
            plan.statements.len(),
            plan.skipped.len()
        );
        Ok(plan)
    }

    /// Render an operation list
    pub fn render_all(&self, ops: &[Operation]) -> SqlResult<RenderPlan> {
        let mut plan = RenderPlan::default();
        for op in ops {
            match self.render(op)? {
                Rendered::Statements(stmts) => plan.statements.extend(stmts),
                Rendered::Skipped(reason) => plan.skipped.push(reason),
            }
        }
        Ok(plan)
    }

    /// Render a single operation
    pub fn render(&self, op: &Operation) -> SqlResult<Rendered> {
        let stmts = match op {
            Operation::CreateTable(create) => vec![self.create_table(create)?],
            Operation::DropTable(t) => vec![format!("DROP TABLE {}", self.qualified(&t.table))],
            Operation::RenameTable(r) => vec![format!(
                "ALTER TABLE {} RENAME TO {}",
                self.qualified(&r.table),
                self.ident(&r.new_name)
            )],
            Operation::AddColumn(add) => self.add_column(add)?,
            Operation::DropColumn(d) => vec![format!(
                "ALTER TABLE {} DROP COLUMN {}",
                self.qualified(&d.table),
                self.ident(&d.column)
            )],
            Operation::RenameColumn(r) => vec![format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                self.qualified(&r.table),
                self.ident(&r.column),
                self.ident(&r.new_name)
            )],
            Operation::AlterColumn(alter) => self.alter_column(alter)?,
            Operation::CreateIndex(idx) => vec![self.create_index(idx)?],
            Operation::DropIndex(d) => vec![format!(
                "DROP INDEX {}",
                self.index_name(&d.table, &d.name)
            )],
            Operation::RenameIndex(r) => {
                if !self.dialect.supports_rename_index() {
                    return Err(
                        self.unsupported(op, "indexes cannot be renamed; drop and recreate it")
                    );
                }
                vec![format!(
                    "ALTER INDEX {} RENAME TO {}",
                    self.index_name(&r.table, &r.name),
                    self.ident(&r.new_name)
                )]
            }
            Operation::AddForeignKey(fk) => {
                if !self.dialect.supports_alter_foreign_keys() {
                    return Err(self.unsupported(
                        op,
                        "foreign keys can only be declared in create_table",
                    ));
                }
                vec![self.add_foreign_key(fk)?]
            }
            Operation::DropForeignKey(fk) => {
                if !self.dialect.supports_alter_foreign_keys() {
                    return Err(self.unsupported(op, "constraints cannot be dropped from a table"));
                }
                vec![format!(
                    "ALTER TABLE {} DROP CONSTRAINT {}",
                    self.qualified(&fk.table),
                    self.ident(&fk.name)
                )]
            }
            Operation::InsertRows(insert) => self.insert_rows(insert)?,
            Operation::UpdateRows(update) => vec![self.update_rows(update)?],
            Operation::DeleteRows(delete) => vec![self.delete_rows(delete)],
            Operation::Sql(sql) => {
                let sql = sql.trim();
                if sql.is_empty() {
                    return Err(invalid(op, "SQL body is empty"));
                }
                vec![sql.to_string()]
            }
            Operation::SqlFile(path) => {
                return Err(invalid(
                    op,
                    &format!("sql_file '{}' was not resolved when the ledger was loaded", path),
                ))
            }
            Operation::Grant(p) | Operation::Revoke(p) => {
                if !self.dialect.supports_grants() {
                    return Ok(Rendered::Skipped(format!(
                        "{} has no roles, skipped {}",
                        self.dialect.name(),
                        op
                    )));
                }
                vec![self.permission(op, p)?]
            }
        };
        Ok(Rendered::Statements(stmts))
    }

    fn create_table(&self, create: &CreateTable) -> SqlResult<String> {
        if create.columns.is_empty() {
            return Err(SqlError::InvalidOperation {
                operation: format!("create_table {}", create.table),
                reason: "a table needs at least one column".to_string(),
            });
        }

        let mut parts: Vec<String> = create
            .columns
            .iter()
            .map(|c| self.column_def(c, true))
            .collect();
        if !create.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.ident_list(&create.primary_key)));
        }
        for fk in &create.foreign_keys {
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}){}",
                self.ident_list(&fk.columns),
                self.qualified(&fk.references_table),
                self.ident_list(&fk.references_columns),
                self.on_delete(&create.table, fk.on_delete)?
            ));
        }

        Ok(format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.qualified(&create.table),
            parts.join(",\n    ")
        ))
    }

    fn add_column(&self, add: &AddColumn) -> SqlResult<Vec<String>> {
        let table = self.qualified(&add.table);
        if add.column.nullable || self.dialect.supports_add_column_constraints() {
            return Ok(vec![format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table,
                self.column_def(&add.column, true)
            )]);
        }

        // Add with the default first so existing rows are filled, then tighten
        Ok(vec![
            format!(
                "ALTER TABLE {} ADD COLUMN {}",
                table,
                self.column_def(&add.column, false)
            ),
            format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                table,
                self.ident(&add.column.name)
            ),
        ])
    }

    fn alter_column(&self, alter: &AlterColumn) -> SqlResult<Vec<String>> {
        let prefix = format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.qualified(&alter.table),
            self.ident(&alter.column)
        );
        let mut stmts = Vec::new();
        if let Some(data_type) = &alter.data_type {
            stmts.push(format!("{} SET DATA TYPE {}", prefix, data_type));
        }
        match &alter.default {
            Some(DefaultChange::Set(value)) => {
                stmts.push(format!("{} SET DEFAULT {}", prefix, quote_literal(value)))
            }
            Some(DefaultChange::SetSql(expr)) => {
                stmts.push(format!("{} SET DEFAULT {}", prefix, expr))
            }
            Some(DefaultChange::Drop) => stmts.push(format!("{} DROP DEFAULT", prefix)),
            None => {}
        }
        match alter.nullable {
            Some(true) => stmts.push(format!("{} DROP NOT NULL", prefix)),
            Some(false) => stmts.push(format!("{} SET NOT NULL", prefix)),
            None => {}
        }
        if stmts.is_empty() {
            return Err(SqlError::InvalidOperation {
                operation: format!("alter_column {}.{}", alter.table, alter.column),
                reason: "nothing to change; set data_type, nullable or default".to_string(),
            });
        }
        Ok(stmts)
    }

    fn create_index(&self, idx: &CreateIndex) -> SqlResult<String> {
        if idx.columns.is_empty() {
            return Err(SqlError::InvalidOperation {
                operation: format!("create_index {}", idx.name),
                reason: "an index needs at least one column".to_string(),
            });
        }
        let mut sql = format!(
            "CREATE {}INDEX {} ON {} ({})",
            if idx.unique { "UNIQUE " } else { "" },
            self.ident(&idx.name),
            self.qualified(&idx.table),
            self.ident_list(&idx.columns)
        );
        if let Some(filter) = &idx.filter {
            if !self.dialect.supports_filtered_indexes() {
                return Err(SqlError::Unsupported {
                    dialect: self.dialect.name().to_string(),
                    operation: format!("create_index {} on {}", idx.name, idx.table),
                    reason: "filtered indexes are not available".to_string(),
                });
            }
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        Ok(sql)
    }

    fn add_foreign_key(&self, fk: &AddForeignKey) -> SqlResult<String> {
        if fk.columns.len() != fk.references_columns.len() || fk.columns.is_empty() {
            return Err(SqlError::InvalidOperation {
                operation: format!("add_foreign_key {}", fk.name),
                reason: "columns and references_columns must be non-empty and the same length"
                    .to_string(),
            });
        }
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}){}",
            self.qualified(&fk.table),
            self.ident(&fk.name),
            self.ident_list(&fk.columns),
            self.qualified(&fk.references_table),
            self.ident_list(&fk.references_columns),
            self.on_delete(&fk.table, fk.on_delete)?
        ))
    }

    fn on_delete(&self, table: &str, action: ReferentialAction) -> SqlResult<String> {
        match action {
            ReferentialAction::NoAction => Ok(String::new()),
            ReferentialAction::Restrict if !self.dialect.supports_cascading_foreign_keys() => {
                // Engines without delete actions already behave as RESTRICT
                Ok(String::new())
            }
            ReferentialAction::Cascade | ReferentialAction::SetNull
                if !self.dialect.supports_cascading_foreign_keys() =>
            {
                Err(SqlError::Unsupported {
                    dialect: self.dialect.name().to_string(),
                    operation: format!("foreign key on {}", table),
                    reason: format!("ON DELETE {} is not available", action),
                })
            }
            other => Ok(format!(" ON DELETE {}", other)),
        }
    }

    fn insert_rows(&self, insert: &InsertRows) -> SqlResult<Vec<String>> {
        if insert.rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut tuples = Vec::with_capacity(insert.rows.len());
        for (i, row) in insert.rows.iter().enumerate() {
            if row.len() != insert.columns.len() {
                return Err(SqlError::InvalidOperation {
                    operation: format!("insert_rows {}", insert.table),
                    reason: format!(
                        "row {} has {} values but {} columns are listed",
                        i + 1,
                        row.len(),
                        insert.columns.len()
                    ),
                });
            }
            let values: Vec<String> = row.iter().map(quote_literal).collect();
            tuples.push(format!("({})", values.join(", ")));
        }
        Ok(vec![format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.qualified(&insert.table),
            self.ident_list(&insert.columns),
            tuples.join(", ")
        )])
    }

    fn update_rows(&self, update: &UpdateRows) -> SqlResult<String> {
        if update.set.is_empty() {
            return Err(SqlError::InvalidOperation {
                operation: format!("update_rows {}", update.table),
                reason: "set must name at least one column".to_string(),
            });
        }
        let assignments: Vec<String> = update
            .set
            .iter()
            .map(|(col, value)| format!("{} = {}", self.ident(col), quote_literal(value)))
            .collect();
        Ok(format!(
            "UPDATE {} SET {}{}",
            self.qualified(&update.table),
            assignments.join(", "),
            self.where_clause(&update.filter)
        ))
    }

    fn delete_rows(&self, delete: &DeleteRows) -> String {
        format!(
            "DELETE FROM {}{}",
            self.qualified(&delete.table),
            self.where_clause(&delete.filter)
        )
    }

    fn permission(&self, op: &Operation, p: &Permission) -> SqlResult<String> {
        if p.privileges.is_empty() {
            return Err(invalid(op, "at least one privilege is required"));
        }
        let privileges: Vec<String> = p.privileges.iter().map(|p| p.to_string()).collect();
        let (verb, preposition) = match op {
            Operation::Revoke(_) => ("REVOKE", "FROM"),
            _ => ("GRANT", "TO"),
        };
        Ok(format!(
            "{} {} ON {} {} {}",
            verb,
            privileges.join(", "),
            self.qualified(&p.table),
            preposition,
            self.ident(&p.role)
        ))
    }

    fn where_clause(&self, filter: &BTreeMap<String, Value>) -> String {
        if filter.is_empty() {
            return String::new();
        }
        let predicates: Vec<String> = filter
            .iter()
            .map(|(col, value)| {
                if value.is_null() {
                    format!("{} IS NULL", self.ident(col))
                } else {
                    format!("{} = {}", self.ident(col), quote_literal(value))
                }
            })
            .collect();
        format!(" WHERE {}", predicates.join(" AND "))
    }

    fn column_def(&self, col: &ColumnDef, with_constraints: bool) -> String {
        let mut sql = format!("{} {}", self.ident(&col.name), col.data_type);
        if let Some(value) = &col.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&quote_literal(value));
        } else if let Some(expr) = &col.default_sql {
            sql.push_str(" DEFAULT ");
            sql.push_str(expr);
        }
        if with_constraints && !col.nullable {
            sql.push_str(" NOT NULL");
        }
        sql
    }

    /// Quote a possibly schema-qualified name part by part
    pub fn qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.dialect.quote_ident(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a single identifier
    pub fn ident(&self, name: &str) -> String {
        self.dialect.quote_ident(name)
    }

    fn ident_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Indexes live in their table's schema
    fn index_name(&self, table: &str, index: &str) -> String {
        match table.rsplit_once('.') {
            Some((schema, _)) => format!("{}.{}", self.qualified(schema), self.ident(index)),
            None => self.ident(index),
        }
    }

    fn unsupported(&self, op: &Operation, reason: &str) -> SqlError {
        SqlError::Unsupported {
            dialect: self.dialect.name().to_string(),
            operation: op.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn invalid(op: &Operation, reason: &str) -> SqlError {
    SqlError::InvalidOperation {
        operation: op.kind().to_string(),
        reason: reason.to_string(),
    }
}

/// Render a literal value as SQL
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => format!("{:?}", f),
        Value::Text(s) => quote_string(s),
    }
}

/// Render a string as a single-quoted SQL literal
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
