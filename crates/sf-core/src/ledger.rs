//! The schema ledger: every migration unit in order.
//!
//! Loaded from a flat migrations directory. Files are `<id>.yml` or
//! `<id>.yaml`; sub-directories named after an id hold that unit's external
//! SQL files and are not scanned for migrations.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use crate::migration_id::MigrationId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What two or more units have in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Same name under different timestamps
    Name,
    /// Same timestamp, different names
    Timestamp,
}

/// A group of units whose identifiers collide on name or timestamp.
///
/// Usually a renumbering accident or iterative rework left in history.
/// Reported, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub kind: CollisionKind,
    /// The shared name or timestamp
    pub key: String,
    pub ids: Vec<MigrationId>,
}

/// Ordered, validated list of migration units.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Directory the ledger was loaded from (empty for in-memory ledgers)
    pub root: PathBuf,
    migrations: Vec<Migration>,
}

impl Ledger {
    /// Load every migration file in `dir`.
    pub fn load(dir: &Path) -> CoreResult<Self> {
        if !dir.is_dir() {
            return Err(CoreError::MigrationsDirNotFound {
                path: dir.display().to_string(),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_migration_file(path))
            .collect();
        paths.sort();

        let mut migrations = Vec::with_capacity(paths.len());
        for path in &paths {
            migrations.push(Migration::load(path)?);
        }

        let mut ledger = Self::from_migrations(migrations)?;
        ledger.root = dir.to_path_buf();
        log::debug!(
            "Loaded {} migrations from {}",
            ledger.len(),
            dir.display()
        );
        Ok(ledger)
    }

    /// Build a ledger from in-memory units, sorting them by id.
    pub fn from_migrations(mut migrations: Vec<Migration>) -> CoreResult<Self> {
        migrations.sort_by(|a, b| a.id.cmp(&b.id));
        for pair in migrations.windows(2) {
            if pair[0].id == pair[1].id {
                return Err(CoreError::DuplicateMigration {
                    id: pair[0].id.to_string(),
                    path1: pair[0].path.display().to_string(),
                    path2: pair[1].path.display().to_string(),
                });
            }
        }
        Ok(Self {
            root: PathBuf::new(),
            migrations,
        })
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    /// Returns true if the ledger has no units
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Units in ledger order
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Iterate units in ledger order
    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    /// The most recent unit
    pub fn last(&self) -> Option<&Migration> {
        self.migrations.last()
    }

    /// Look up a unit by exact id
    pub fn get(&self, id: &str) -> Option<&Migration> {
        self.migrations
            .binary_search_by(|m| m.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.migrations[idx])
    }

    /// Position of a unit in ledger order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.migrations
            .binary_search_by(|m| m.id.as_str().cmp(id))
            .ok()
    }

    /// Resolve a full id or a bare migration name.
    ///
    /// Bare names that match several units (see [`Ledger::collisions`]) are
    /// rejected rather than guessed.
    pub fn find(&self, id_or_name: &str) -> CoreResult<&Migration> {
        if let Some(m) = self.get(id_or_name) {
            return Ok(m);
        }
        let matches: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| m.name() == id_or_name)
            .collect();
        match matches.as_slice() {
            [] => Err(CoreError::MigrationNotFound {
                name: id_or_name.to_string(),
            }),
            [single] => Ok(single),
            many => Err(CoreError::AmbiguousMigrationName {
                name: id_or_name.to_string(),
                candidates: many
                    .iter()
                    .map(|m| m.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Units that cannot be reverted
    pub fn irreversible(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter().filter(|m| m.down.is_empty())
    }

    /// Groups of units sharing a name or a timestamp.
    pub fn collisions(&self) -> Vec<Collision> {
        let mut by_name: BTreeMap<&str, Vec<MigrationId>> = BTreeMap::new();
        let mut by_timestamp: BTreeMap<&str, Vec<MigrationId>> = BTreeMap::new();
        for m in &self.migrations {
            by_name.entry(m.id.name()).or_default().push(m.id.clone());
            by_timestamp
                .entry(m.id.timestamp())
                .or_default()
                .push(m.id.clone());
        }

        let group = |kind: CollisionKind, map: BTreeMap<&str, Vec<MigrationId>>| {
            map.into_iter()
                .filter(|(_, ids)| ids.len() > 1)
                .map(move |(key, ids)| Collision {
                    kind,
                    key: key.to_string(),
                    ids,
                })
                .collect::<Vec<_>>()
        };

        let mut collisions = group(CollisionKind::Name, by_name);
        collisions.extend(group(CollisionKind::Timestamp, by_timestamp));
        collisions
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.iter()
    }
}

fn is_migration_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    !hidden && path.extension().is_some_and(|e| e == "yml" || e == "yaml")
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
