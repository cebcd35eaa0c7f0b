//! sf-ledger - Migration runner for Schemaflow
//!
//! Applies and reverts migration units against a database, records them in
//! a history table, and checks the ledger by round-tripping and replaying it
//! on an isolated in-memory database.

pub mod error;
pub mod history;
pub mod lint;
pub mod runner;
pub mod verify;

pub use error::{LedgerError, LedgerResult};
pub use history::{AppliedMigration, HistoryStore};
pub use lint::{has_errors, lint, Finding, Severity};
pub use runner::{
    DownTarget, MigrationState, PlannedUnit, Runner, RunnerOptions, StatusEntry, UnitReport,
};
pub use verify::{check, replay, verify_round_trip, VerifyOutcome, VerifyReport};
