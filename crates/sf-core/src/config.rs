//! Configuration types and parsing for schemaflow.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file names searched in a project directory, in priority order.
pub const CONFIG_FILE_NAMES: &[&str] = &["schemaflow.yml", "schemaflow.yaml"];

/// Main project configuration from schemaflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory containing migration files
    #[serde(default = "default_migrations_path")]
    pub migrations_path: String,

    /// Declared schema snapshot used by `sf check`
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// SQL dialect used to render operations
    #[serde(default)]
    pub dialect: Dialect,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where applied migrations are recorded
    #[serde(default)]
    pub history: HistoryConfig,

    /// Refuse to run when an applied migration's file has changed
    #[serde(default = "default_true")]
    pub validate_checksums: bool,

    /// Allow pending migrations older than the latest applied one
    #[serde(default)]
    pub allow_out_of_order: bool,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl DbType {
    /// SQL dialect the engine executes
    pub fn dialect(self) -> Dialect {
        match self {
            DbType::DuckDb => Dialect::DuckDb,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file path or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// Location of the migration history table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Schema holding the history table
    #[serde(default = "default_history_schema")]
    pub schema: String,

    /// History table name
    #[serde(default = "default_history_table")]
    pub table: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            schema: default_history_schema(),
            table: default_history_table(),
        }
    }
}

impl HistoryConfig {
    /// Schema-qualified history table name
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// PostgreSQL dialect (render only)
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

fn default_migrations_path() -> String {
    "migrations".to_string()
}

fn default_snapshot_path() -> String {
    "schema_snapshot.json".to_string()
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_history_schema() -> String {
    "sf_meta".to_string()
}

fn default_history_table() -> String {
    "schema_migrations".to_string()
}

impl Config {
    /// Build a config with every field at its default
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            migrations_path: default_migrations_path(),
            snapshot_path: default_snapshot_path(),
            dialect: Dialect::default(),
            database: DatabaseConfig::default(),
            history: HistoryConfig::default(),
            validate_checksums: true,
            allow_out_of_order: false,
            targets: HashMap::new(),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for schemaflow.yml or schemaflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for file_name in CONFIG_FILE_NAMES {
            let path = dir.join(file_name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.migrations_path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_path cannot be empty".to_string(),
            });
        }

        for (label, ident) in [
            ("history.schema", &self.history.schema),
            ("history.table", &self.history.table),
        ] {
            let valid = !ident.is_empty()
                && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !ident.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{} must be a plain identifier (letters, digits, '_'), got '{}'",
                        label, ident
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get absolute migrations directory relative to a project root
    pub fn migrations_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_path)
    }

    /// Get absolute snapshot file path relative to a project root
    pub fn snapshot_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.snapshot_path)
    }

    /// Get the list of available target names
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get database configuration, optionally applying target overrides
    ///
    /// If target is specified and exists, uses target's database config.
    /// Otherwise, uses the base database config.
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.available_targets().join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Resolve target from CLI flag or SF_TARGET environment variable
    ///
    /// Priority: CLI flag > SF_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var("SF_TARGET").ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
