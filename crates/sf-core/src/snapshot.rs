//! Schema snapshots: a comparable picture of tables, indexes and row data.
//!
//! Backends capture snapshots; the ledger compares them to prove that a
//! down body restores what its up body changed, and that replaying the whole
//! ledger reaches the declared schema.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One column as reported by the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSnapshot {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One index as reported by the engine's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub unique: bool,
    /// Engine-reported definition, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// One table-level constraint: primary key, unique, foreign key or check.
///
/// NOT NULL is carried by [`ColumnSnapshot::nullable`] instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstraintSnapshot {
    /// Engine constraint type, e.g. `PRIMARY KEY`
    pub kind: String,
    pub columns: Vec<String>,
    /// Engine-reported definition
    pub text: String,
}

/// One table: structure plus a digest of its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexSnapshot>,
    /// Sorted so capture order never shows up as a difference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintSnapshot>,
    pub row_count: u64,
    /// SHA-256 over the sorted textual rows
    pub data_checksum: String,
}

/// All user tables keyed by `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, TableSnapshot>,
}

/// What to compare in [`SchemaSnapshot::diff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Structure and row data
    #[default]
    Full,
    /// Structure only
    SchemaOnly,
}

impl SchemaSnapshot {
    /// Read a snapshot file written by [`SchemaSnapshot::save`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot as pretty JSON with a trailing newline.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Human-readable differences from `self` (expected) to `actual`.
    ///
    /// Empty when the snapshots are equivalent under `mode`.
    pub fn diff(&self, actual: &SchemaSnapshot, mode: DiffMode) -> Vec<String> {
        let mut out = Vec::new();

        for name in self.tables.keys() {
            if !actual.tables.contains_key(name) {
                out.push(format!("table {} is missing", name));
            }
        }
        for name in actual.tables.keys() {
            if !self.tables.contains_key(name) {
                out.push(format!("table {} is unexpected", name));
            }
        }

        for (name, expected) in &self.tables {
            let Some(found) = actual.tables.get(name) else {
                continue;
            };
            diff_columns(name, &expected.columns, &found.columns, &mut out);
            diff_indexes(name, &expected.indexes, &found.indexes, &mut out);
            diff_constraints(name, &expected.constraints, &found.constraints, &mut out);

            if mode == DiffMode::Full {
                if expected.row_count != found.row_count {
                    out.push(format!(
                        "table {}: expected {} rows, found {}",
                        name, expected.row_count, found.row_count
                    ));
                } else if expected.data_checksum != found.data_checksum {
                    out.push(format!("table {}: row data differs", name));
                }
            }
        }

        out
    }
}

fn diff_columns(
    table: &str,
    expected: &[ColumnSnapshot],
    actual: &[ColumnSnapshot],
    out: &mut Vec<String>,
) {
    for col in expected {
        match actual.iter().find(|c| c.name == col.name) {
            None => out.push(format!("column {}.{} is missing", table, col.name)),
            Some(found) if found != col => out.push(format!(
                "column {}.{} differs: expected {}, found {}",
                table,
                col.name,
                describe_column(col),
                describe_column(found)
            )),
            Some(_) => {}
        }
    }
    for col in actual {
        if !expected.iter().any(|c| c.name == col.name) {
            out.push(format!("column {}.{} is unexpected", table, col.name));
        }
    }

    let expected_order: Vec<&str> = expected.iter().map(|c| c.name.as_str()).collect();
    let actual_order: Vec<&str> = actual.iter().map(|c| c.name.as_str()).collect();
    let same_set = expected.len() == actual.len()
        && expected_order.iter().all(|n| actual_order.contains(n));
    if same_set && expected_order != actual_order {
        out.push(format!(
            "table {}: column order differs: expected [{}], found [{}]",
            table,
            expected_order.join(", "),
            actual_order.join(", ")
        ));
    }
}

fn diff_indexes(
    table: &str,
    expected: &BTreeMap<String, IndexSnapshot>,
    actual: &BTreeMap<String, IndexSnapshot>,
    out: &mut Vec<String>,
) {
    for (name, idx) in expected {
        match actual.get(name) {
            None => out.push(format!("index {} on {} is missing", name, table)),
            Some(found) if found != idx => {
                out.push(format!("index {} on {} differs", name, table))
            }
            Some(_) => {}
        }
    }
    for name in actual.keys() {
        if !expected.contains_key(name) {
            out.push(format!("index {} on {} is unexpected", name, table));
        }
    }
}

fn diff_constraints(
    table: &str,
    expected: &[ConstraintSnapshot],
    actual: &[ConstraintSnapshot],
    out: &mut Vec<String>,
) {
    for constraint in expected {
        if !actual.contains(constraint) {
            out.push(format!("constraint {} on {} is missing", constraint.text, table));
        }
    }
    for constraint in actual {
        if !expected.contains(constraint) {
            out.push(format!("constraint {} on {} is unexpected", constraint.text, table));
        }
    }
}

fn describe_column(col: &ColumnSnapshot) -> String {
    let mut s = col.data_type.clone();
    if !col.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(default) = &col.default {
        s.push_str(" DEFAULT ");
        s.push_str(default);
    }
    s
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod tests;
