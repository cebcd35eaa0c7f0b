//! Error types for sf-ledger

use sf_core::CoreError;
use sf_db::DbError;
use sf_sql::SqlError;
use thiserror::Error;

/// Runner, verification and history errors
#[derive(Error, Debug)]
pub enum LedgerError {
    /// An applied unit was edited after it ran (L001)
    #[error("[L001] Migration {id} was modified after it was applied (recorded checksum {recorded}, current {current})")]
    ChecksumMismatch {
        id: String,
        recorded: String,
        current: String,
    },

    /// A pending unit sorts before the latest applied one (L002)
    #[error("[L002] Migration {id} is pending but older than the latest applied migration {latest}; set allow_out_of_order to apply it")]
    OutOfOrder { id: String, latest: String },

    /// Revert target is not applied (L003)
    #[error("[L003] Cannot revert to {id}: it is not applied")]
    TargetNotApplied { id: String },

    /// Revert of a forward-only unit without force (L004)
    #[error("[L004] Migration {id} is irreversible ({reason}); pass --allow-irreversible to remove its history entry without running SQL")]
    IrreversibleRevert { id: String, reason: String },

    /// Recorded unit has no file in the ledger (L005)
    #[error("[L005] Migration {id} is recorded as applied but has no file in the ledger")]
    MissingFromLedger { id: String },

    /// Unit failed and its transaction was rolled back (L006)
    #[error("[L006] Migration {id} ({direction}) failed and was rolled back: {source}")]
    Failed {
        id: String,
        direction: String,
        #[source]
        source: DbError,
    },

    /// Non-transactional unit failed part way (L007)
    #[error("[L007] Migration {id} ({direction}) ran outside a transaction and failed after {completed} of {total} statements: {source}\n  Manual cleanup is required before retrying; the migration was not recorded")]
    ManualCleanupRequired {
        id: String,
        direction: String,
        completed: usize,
        total: usize,
        #[source]
        source: DbError,
    },

    /// History table content is unreadable (L008)
    #[error("[L008] History table {table} is invalid: {message}")]
    HistoryInvalid { table: String, message: String },

    /// Core error (L009)
    #[error("[L009] {0}")]
    Core(#[from] CoreError),

    /// Rendering error (L010)
    #[error("[L010] {0}")]
    Sql(#[from] SqlError),

    /// Database error (L011)
    #[error("[L011] {0}")]
    Db(#[from] DbError),
}

/// Result type alias for LedgerError
pub type LedgerResult<T> = Result<T, LedgerError>;

impl LedgerError {
    /// Returns true if the error came from executing SQL against the database
    pub fn is_database_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Failed { .. }
                | LedgerError::ManualCleanupRequired { .. }
                | LedgerError::Db(_)
        )
    }
}
