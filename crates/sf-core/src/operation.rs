//! The operation vocabulary a migration is written in.
//!
//! Every migration is a list of [`Operation`] values. One interpreter in
//! `sf-sql` renders them to dialect SQL; there is no per-migration code.
//!
//! In YAML each operation is a single-key map whose key is the operation kind:
//!
//! ```yaml
//! - add_column:
//!     table: Releases
//!     column: { name: TimePeriodCoverage, type: INTEGER, nullable: false, default: 0 }
//! - sql: "UPDATE Releases SET TimePeriodCoverage = 1 WHERE Year > 2000"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A literal value in seed rows, filters and column defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean literal
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// Text literal
    Text(String),
}

impl Value {
    /// Returns true for [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// False for NaN and infinite floats, which have no SQL or JSON literal
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Column definition used by `create_table` and `add_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    /// Column name
    pub name: String,

    /// SQL type, passed through to the engine verbatim
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether the column accepts NULL
    #[serde(default = "crate::serde_helpers::default_true")]
    pub nullable: bool,

    /// Literal default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Raw SQL default expression (e.g. `now()`), used when `default` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sql: Option<String>,
}

impl ColumnDef {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
            default_sql: None,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set a literal default.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Returns true if the column has a literal or expression default.
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_sql.is_some()
    }
}

/// Behaviour of a foreign key when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// Reject the delete at end of statement (default)
    #[default]
    NoAction,
    /// Reject the delete immediately
    Restrict,
    /// Delete referencing rows too
    Cascade,
    /// Null out referencing columns
    SetNull,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferentialAction::NoAction => write!(f, "NO ACTION"),
            ReferentialAction::Restrict => write!(f, "RESTRICT"),
            ReferentialAction::Cascade => write!(f, "CASCADE"),
            ReferentialAction::SetNull => write!(f, "SET NULL"),
        }
    }
}

/// Foreign key declared inline in `create_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKeyDef {
    /// Referencing columns
    pub columns: Vec<String>,
    /// Referenced table
    pub references_table: String,
    /// Referenced columns
    pub references_columns: Vec<String>,
    /// Delete behaviour
    #[serde(default)]
    pub on_delete: ReferentialAction,
}

/// Payload of `create_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// Payload of operations that only name a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableRef {
    pub table: String,
}

/// Payload of `rename_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameTable {
    pub table: String,
    pub new_name: String,
}

/// Payload of `add_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddColumn {
    pub table: String,
    pub column: ColumnDef,
}

/// Payload of `drop_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropColumn {
    pub table: String,
    pub column: String,
}

/// Payload of `rename_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameColumn {
    pub table: String,
    pub column: String,
    pub new_name: String,
}

/// Change to a column default in `alter_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultChange {
    /// Set a literal default
    Set(Value),
    /// Set a raw SQL default expression
    SetSql(String),
    /// Remove the default
    Drop,
}

/// Payload of `alter_column`. Unset fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlterColumn {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultChange>,
}

/// Payload of `create_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    /// Predicate for a filtered (partial) index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Payload of `drop_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropIndex {
    pub name: String,
    pub table: String,
}

/// Payload of `rename_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenameIndex {
    pub name: String,
    pub table: String,
    pub new_name: String,
}

/// Payload of `add_foreign_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddForeignKey {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub references_table: String,
    pub references_columns: Vec<String>,
    #[serde(default)]
    pub on_delete: ReferentialAction,
}

/// Payload of `drop_foreign_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DropForeignKey {
    pub name: String,
    pub table: String,
}

/// Payload of `insert_rows`. Each row lines up with `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsertRows {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Payload of `update_rows`. `filter` entries are AND-ed equality predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRows {
    pub table: String,
    pub set: BTreeMap<String, Value>,
    #[serde(default)]
    pub filter: BTreeMap<String, Value>,
}

/// Payload of `delete_rows`. An empty filter deletes every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteRows {
    pub table: String,
    #[serde(default)]
    pub filter: BTreeMap<String, Value>,
}

/// Table privilege for `grant` / `revoke`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Privilege::Select => write!(f, "SELECT"),
            Privilege::Insert => write!(f, "INSERT"),
            Privilege::Update => write!(f, "UPDATE"),
            Privilege::Delete => write!(f, "DELETE"),
        }
    }
}

/// Payload of `grant` / `revoke`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Permission {
    pub privileges: Vec<Privilege>,
    pub table: String,
    pub role: String,
}

/// A single schema, data or permission change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateTable(CreateTable),
    DropTable(TableRef),
    RenameTable(RenameTable),
    AddColumn(AddColumn),
    DropColumn(DropColumn),
    RenameColumn(RenameColumn),
    AlterColumn(AlterColumn),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    RenameIndex(RenameIndex),
    AddForeignKey(AddForeignKey),
    DropForeignKey(DropForeignKey),
    InsertRows(InsertRows),
    UpdateRows(UpdateRows),
    DeleteRows(DeleteRows),
    /// Raw SQL, one or more statements
    Sql(String),
    /// External SQL file, relative to the migration's own directory.
    /// Replaced by [`Operation::Sql`] when the ledger is loaded.
    SqlFile(String),
    Grant(Permission),
    Revoke(Permission),
}

impl Operation {
    /// Operation kind as written in YAML
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateTable(_) => "create_table",
            Operation::DropTable(_) => "drop_table",
            Operation::RenameTable(_) => "rename_table",
            Operation::AddColumn(_) => "add_column",
            Operation::DropColumn(_) => "drop_column",
            Operation::RenameColumn(_) => "rename_column",
            Operation::AlterColumn(_) => "alter_column",
            Operation::CreateIndex(_) => "create_index",
            Operation::DropIndex(_) => "drop_index",
            Operation::RenameIndex(_) => "rename_index",
            Operation::AddForeignKey(_) => "add_foreign_key",
            Operation::DropForeignKey(_) => "drop_foreign_key",
            Operation::InsertRows(_) => "insert_rows",
            Operation::UpdateRows(_) => "update_rows",
            Operation::DeleteRows(_) => "delete_rows",
            Operation::Sql(_) => "sql",
            Operation::SqlFile(_) => "sql_file",
            Operation::Grant(_) => "grant",
            Operation::Revoke(_) => "revoke",
        }
    }

    /// The table this operation targets, if any
    pub fn table(&self) -> Option<&str> {
        match self {
            Operation::CreateTable(op) => Some(&op.table),
            Operation::DropTable(op) => Some(&op.table),
            Operation::RenameTable(op) => Some(&op.table),
            Operation::AddColumn(op) => Some(&op.table),
            Operation::DropColumn(op) => Some(&op.table),
            Operation::RenameColumn(op) => Some(&op.table),
            Operation::AlterColumn(op) => Some(&op.table),
            Operation::CreateIndex(op) => Some(&op.table),
            Operation::DropIndex(op) => Some(&op.table),
            Operation::RenameIndex(op) => Some(&op.table),
            Operation::AddForeignKey(op) => Some(&op.table),
            Operation::DropForeignKey(op) => Some(&op.table),
            Operation::InsertRows(op) => Some(&op.table),
            Operation::UpdateRows(op) => Some(&op.table),
            Operation::DeleteRows(op) => Some(&op.table),
            Operation::Grant(op) | Operation::Revoke(op) => Some(&op.table),
            Operation::Sql(_) | Operation::SqlFile(_) => None,
        }
    }

    /// Every literal value carried by this operation
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Operation::CreateTable(op) => op
                .columns
                .iter()
                .filter_map(|c| c.default.as_ref())
                .collect(),
            Operation::AddColumn(op) => op.column.default.iter().collect(),
            Operation::AlterColumn(op) => match &op.default {
                Some(DefaultChange::Set(value)) => vec![value],
                _ => Vec::new(),
            },
            Operation::InsertRows(op) => op.rows.iter().flatten().collect(),
            Operation::UpdateRows(op) => op.set.values().chain(op.filter.values()).collect(),
            Operation::DeleteRows(op) => op.filter.values().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true for operations that only change permissions
    pub fn is_permission(&self) -> bool {
        matches!(self, Operation::Grant(_) | Operation::Revoke(_))
    }

    /// Returns true for operations that change rows rather than structure
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Operation::InsertRows(_) | Operation::UpdateRows(_) | Operation::DeleteRows(_)
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::AddColumn(op) => write!(f, "add_column {}.{}", op.table, op.column.name),
            Operation::DropColumn(op) => write!(f, "drop_column {}.{}", op.table, op.column),
            Operation::RenameColumn(op) => write!(
                f,
                "rename_column {}.{} -> {}",
                op.table, op.column, op.new_name
            ),
            Operation::AlterColumn(op) => write!(f, "alter_column {}.{}", op.table, op.column),
            Operation::CreateIndex(op) => write!(f, "create_index {} on {}", op.name, op.table),
            Operation::DropIndex(op) => write!(f, "drop_index {} on {}", op.name, op.table),
            Operation::RenameIndex(op) => {
                write!(f, "rename_index {} -> {}", op.name, op.new_name)
            }
            Operation::RenameTable(op) => write!(f, "rename_table {} -> {}", op.table, op.new_name),
            Operation::AddForeignKey(op) => {
                write!(f, "add_foreign_key {} on {}", op.name, op.table)
            }
            Operation::DropForeignKey(op) => {
                write!(f, "drop_foreign_key {} on {}", op.name, op.table)
            }
            Operation::InsertRows(op) => {
                write!(f, "insert_rows {} ({} rows)", op.table, op.rows.len())
            }
            Operation::Grant(op) | Operation::Revoke(op) => {
                let privileges: Vec<String> = op.privileges.iter().map(|p| p.to_string()).collect();
                write!(
                    f,
                    "{} {} on {} to {}",
                    self.kind(),
                    privileges.join(", "),
                    op.table,
                    op.role
                )
            }
            Operation::Sql(sql) => {
                let first = sql.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                write!(f, "sql {}", first.trim())
            }
            Operation::SqlFile(path) => write!(f, "sql_file {}", path),
            other => match other.table() {
                Some(table) => write!(f, "{} {}", other.kind(), table),
                None => write!(f, "{}", other.kind()),
            },
        }
    }
}

#[cfg(test)]
#[path = "operation_test.rs"]
mod tests;
