//! Migration units: one named, ordered change with its inverse.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::migration_id::MigrationId;
use crate::operation::Operation;
use crate::serde_helpers::{default_true, is_true};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// On-disk form of a migration file (`migrations/<id>.yml`).
///
/// The identifier comes from the file name, not the file body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationFile {
    /// Free-form description shown by `sf status`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Run the unit inside a single transaction (default: true)
    #[serde(default = "default_true", rename = "transaction")]
    pub transactional: bool,

    /// Why this unit cannot be (fully) reverted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irreversible: Option<String>,

    /// Forward operations
    pub up: Vec<Operation>,

    /// Reverse operations
    #[serde(default)]
    pub down: Vec<Operation>,
}

/// How far a unit's down body undoes its up body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Reversibility {
    /// Down restores the prior state
    Reversible,
    /// Down exists but is known not to restore everything
    Partial(String),
    /// Forward-only: down is empty and annotated
    Irreversible(String),
}

impl Reversibility {
    /// Short label for tables
    pub fn label(&self) -> &'static str {
        match self {
            Reversibility::Reversible => "reversible",
            Reversibility::Partial(_) => "partial",
            Reversibility::Irreversible(_) => "irreversible",
        }
    }

    /// The author's annotation, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Reversibility::Reversible => None,
            Reversibility::Partial(r) | Reversibility::Irreversible(r) => Some(r),
        }
    }
}

impl fmt::Display for Reversibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{} ({})", self.label(), reason),
            None => f.write_str(self.label()),
        }
    }
}

/// Direction a unit is run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A loaded, validated migration unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Migration {
    /// Unique, sortable identifier
    pub id: MigrationId,

    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Run inside a single transaction
    #[serde(skip_serializing_if = "is_true")]
    pub transactional: bool,

    /// Annotation for forward-only or partially reversible units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irreversible: Option<String>,

    /// Forward operations, `sql_file` already resolved
    pub up: Vec<Operation>,

    /// Reverse operations, `sql_file` already resolved
    pub down: Vec<Operation>,

    /// File the unit was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl Migration {
    /// Build a migration in memory, applying the same validation as the loader.
    pub fn new(
        id: MigrationId,
        up: Vec<Operation>,
        down: Vec<Operation>,
        irreversible: Option<String>,
    ) -> CoreResult<Self> {
        let migration = Self {
            id,
            description: None,
            transactional: true,
            irreversible,
            up,
            down,
            path: PathBuf::new(),
        };
        migration.validate()?;
        Ok(migration)
    }

    /// Mark the unit as running outside a transaction.
    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }

    /// Load a migration file, resolving `sql_file` references against
    /// `<migrations_dir>/<id>/`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CoreError::MigrationParseError {
                path: path.display().to_string(),
                details: "file name is not valid UTF-8".to_string(),
            })?;
        let id = MigrationId::parse(stem)?;

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: MigrationFile =
            serde_yaml::from_str(&content).map_err(|e| CoreError::MigrationParseError {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        let sql_dir = path
            .parent()
            .map(|dir| dir.join(id.as_str()))
            .unwrap_or_else(|| PathBuf::from(id.as_str()));
        let up = resolve_sql_files(&id, &sql_dir, file.up)?;
        let down = resolve_sql_files(&id, &sql_dir, file.down)?;

        let migration = Self {
            id,
            description: file.description,
            transactional: file.transactional,
            irreversible: file.irreversible,
            up,
            down,
            path: path.to_path_buf(),
        };
        migration.validate()?;
        Ok(migration)
    }

    fn validate(&self) -> CoreResult<()> {
        if self.up.is_empty() {
            return Err(CoreError::EmptyUp {
                id: self.id.to_string(),
            });
        }
        let annotated = self
            .irreversible
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if self.down.is_empty() && !annotated {
            return Err(CoreError::MissingIrreversibleReason {
                id: self.id.to_string(),
            });
        }
        if let Some(op) = self
            .up
            .iter()
            .chain(&self.down)
            .find(|op| op.values().iter().any(|v| !v.is_finite()))
        {
            return Err(CoreError::NonFiniteValue {
                id: self.id.to_string(),
                operation: op.to_string(),
            });
        }
        Ok(())
    }

    /// Migration name (identifier without the timestamp)
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// How far the down body undoes the up body
    pub fn reversibility(&self) -> Reversibility {
        match (&self.irreversible, self.down.is_empty()) {
            (Some(reason), true) => Reversibility::Irreversible(reason.clone()),
            (Some(reason), false) => Reversibility::Partial(reason.clone()),
            // Rejected by validate(); only reachable for hand-built values
            (None, true) => Reversibility::Irreversible(String::new()),
            (None, false) => Reversibility::Reversible,
        }
    }

    /// Returns true if the down body fully restores the prior state
    pub fn is_reversible(&self) -> bool {
        self.reversibility() == Reversibility::Reversible
    }

    /// Operations for the given direction
    pub fn operations(&self, direction: Direction) -> &[Operation] {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// SHA-256 over the canonical JSON form of the unit.
    ///
    /// External SQL files are already inlined, so editing one changes the
    /// checksum as well.
    pub fn checksum(&self) -> String {
        // Only non-finite floats fail to serialize, and validate() rejects them
        let canonical = serde_json::to_string(self).unwrap_or_default();
        compute_checksum(&canonical)
    }
}

/// Replace every `sql_file` operation with the file's contents.
fn resolve_sql_files(
    id: &MigrationId,
    sql_dir: &Path,
    ops: Vec<Operation>,
) -> CoreResult<Vec<Operation>> {
    ops.into_iter()
        .map(|op| match op {
            Operation::SqlFile(file) => {
                let relative = Path::new(&file);
                let escapes = relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
                if escapes {
                    return Err(CoreError::SqlFileOutsideDir {
                        id: id.to_string(),
                        path: relative.display().to_string(),
                    });
                }
                let path = sql_dir.join(relative);
                if !path.is_file() {
                    return Err(CoreError::SqlFileNotFound {
                        id: id.to_string(),
                        path: path.display().to_string(),
                    });
                }
                let sql = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                    path: path.display().to_string(),
                    source: e,
                })?;
                log::debug!("Resolved {} for migration {}", path.display(), id);
                Ok(Operation::Sql(sql))
            }
            other => Ok(other),
        })
        .collect()
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
