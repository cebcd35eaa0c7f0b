//! sf-core - Core library for Schemaflow
//!
//! This crate provides configuration parsing, the migration operation model,
//! migration units, ledger loading and validation, and schema snapshots used
//! across all Schemaflow components.

pub mod checksum;
pub mod config;
pub mod error;
pub mod ledger;
pub mod migration;
pub mod migration_id;
pub mod operation;
pub(crate) mod serde_helpers;
pub mod snapshot;

pub use checksum::compute_checksum;
pub use config::{Config, DbType, Dialect, HistoryConfig};
pub use error::{CoreError, CoreResult};
pub use ledger::{Collision, CollisionKind, Ledger};
pub use migration::{Direction, Migration, MigrationFile, Reversibility};
pub use migration_id::MigrationId;
pub use operation::{ColumnDef, Operation, Value};
pub use snapshot::{ConstraintSnapshot, DiffMode, SchemaSnapshot};
