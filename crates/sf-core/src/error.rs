//! Error types for sf-core

use thiserror::Error;

/// Core error type for Schemaflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Migrations directory not found
    #[error("[E003] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// E004: Malformed migration identifier
    #[error("[E004] Invalid migration id '{id}': {reason}")]
    InvalidMigrationId { id: String, reason: String },

    /// E005: Migration file could not be parsed
    #[error("[E005] Failed to parse migration {path}: {details}")]
    MigrationParseError { path: String, details: String },

    /// E006: Two migration files resolve to the same identifier
    #[error("[E006] Duplicate migration id '{id}' in {path1} and {path2}")]
    DuplicateMigration {
        id: String,
        path1: String,
        path2: String,
    },

    /// E007: Empty down body without an irreversible annotation
    #[error("[E007] Migration '{id}' has an empty down body. Add `irreversible: <reason>` if it is forward-only")]
    MissingIrreversibleReason { id: String },

    /// E008: Migration with nothing to apply
    #[error("[E008] Migration '{id}' has an empty up body")]
    EmptyUp { id: String },

    /// E009: External SQL file referenced by a migration is missing
    #[error("[E009] Migration '{id}' references missing SQL file: {path}")]
    SqlFileNotFound { id: String, path: String },

    /// E010: No migration matches the requested id or name
    #[error("[E010] Migration not found: {name}")]
    MigrationNotFound { name: String },

    /// E011: A bare name matches more than one migration
    #[error("[E011] Migration name '{name}' is ambiguous, matches: {candidates}")]
    AmbiguousMigrationName { name: String, candidates: String },

    /// E012: IO error
    #[error("[E012] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E013: IO error with file path context
    #[error("[E013] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E014: YAML parse error
    #[error("[E014] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// E015: Float literal that is NaN or infinite
    #[error("[E015] Migration '{id}' has a non-finite number in {operation}")]
    NonFiniteValue { id: String, operation: String },

    /// E016: `sql_file` path that leaves the unit's SQL directory
    #[error("[E016] Migration '{id}' sql_file must be a relative path inside its directory: {path}")]
    SqlFileOutsideDir { id: String, path: String },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
