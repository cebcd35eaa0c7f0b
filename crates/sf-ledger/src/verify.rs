//! Round-trip and replay checks on an isolated in-memory database.
//!
//! Nothing here touches the configured database: every check builds its
//! own DuckDB instance from the ledger alone.

use crate::error::{LedgerError, LedgerResult};
use serde::Serialize;
use sf_core::{DiffMode, Direction, Ledger, Migration, Reversibility, SchemaSnapshot};
use sf_db::{Database, DuckDbBackend};
use sf_sql::{SqlError, SqlRenderer};

/// Result of round-tripping one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "details", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Down restored exactly the state before Up
    Passed,
    /// Not round-tripped; carries the unit's annotation
    Skipped(String),
    /// The unit cannot be expressed on the engine; checking stopped here
    Unsupported(String),
    /// Down did not restore the prior state
    Mismatch(Vec<String>),
    /// Up or Down failed to execute; checking stopped here
    Failed(String),
}

impl VerifyOutcome {
    /// Returns true if this outcome fails verification
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            VerifyOutcome::Unsupported(_) | VerifyOutcome::Mismatch(_) | VerifyOutcome::Failed(_)
        )
    }
}

/// Round-trip result for one unit
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub id: String,
    pub outcome: VerifyOutcome,
}

fn renderer() -> SqlRenderer {
    SqlRenderer::for_dialect(sf_core::Dialect::DuckDb)
}

/// Run one direction of a unit in a transaction.
async fn run(
    db: &dyn Database,
    renderer: &SqlRenderer,
    migration: &Migration,
    direction: Direction,
) -> LedgerResult<()> {
    let plan = renderer.render_migration(migration, direction)?;
    db.execute_in_transaction(&plan.statements)
        .await
        .map_err(|source| LedgerError::Failed {
            id: migration.id.to_string(),
            direction: direction.to_string(),
            source,
        })
}

/// For each unit in order: snapshot, Up, Down, snapshot, compare, then Up
/// again so the next unit sees the state it was written against.
///
/// With `only`, earlier units are applied without checking and the
/// sequence stops after the named unit.
pub async fn verify_round_trip(
    ledger: &Ledger,
    only: Option<&str>,
) -> LedgerResult<Vec<VerifyReport>> {
    let only = match only {
        Some(name) => Some(ledger.find(name)?.id.as_str()),
        None => None,
    };
    let db = DuckDbBackend::in_memory()?;
    let renderer = renderer();
    let mut reports = Vec::new();

    for migration in ledger.iter() {
        let id = migration.id.as_str();
        if only.is_some_and(|o| id < o) {
            run(&db, &renderer, migration, Direction::Up).await?;
            continue;
        }

        let outcome = round_trip(&db, &renderer, migration).await?;
        log::debug!("Verified {}: {:?}", id, outcome);
        let stop = matches!(
            outcome,
            VerifyOutcome::Unsupported(_) | VerifyOutcome::Failed(_)
        );
        reports.push(VerifyReport {
            id: id.to_string(),
            outcome,
        });
        if stop || only.is_some() {
            break;
        }
    }
    Ok(reports)
}

async fn round_trip(
    db: &dyn Database,
    renderer: &SqlRenderer,
    migration: &Migration,
) -> LedgerResult<VerifyOutcome> {
    // Render both directions first so unsupported units never touch the database
    let (up, down) = match (
        renderer.render_migration(migration, Direction::Up),
        renderer.render_migration(migration, Direction::Down),
    ) {
        (Ok(up), Ok(down)) => (up, down),
        (Err(e @ SqlError::Unsupported { .. }), _) | (_, Err(e @ SqlError::Unsupported { .. })) => {
            return Ok(VerifyOutcome::Unsupported(e.to_string()))
        }
        (Err(e), _) | (_, Err(e)) => return Ok(VerifyOutcome::Failed(e.to_string())),
    };

    let annotation = match migration.reversibility() {
        Reversibility::Reversible => None,
        other => Some(other.to_string()),
    };
    if let Some(annotation) = annotation {
        return Ok(match db.execute_in_transaction(&up.statements).await {
            Ok(()) => VerifyOutcome::Skipped(annotation),
            Err(e) => VerifyOutcome::Failed(format!("up: {}", e)),
        });
    }

    let before = db.capture_snapshot(&[]).await?;
    if let Err(e) = db.execute_in_transaction(&up.statements).await {
        return Ok(VerifyOutcome::Failed(format!("up: {}", e)));
    }
    if let Err(e) = db.execute_in_transaction(&down.statements).await {
        return Ok(VerifyOutcome::Failed(format!("down: {}", e)));
    }
    let after = db.capture_snapshot(&[]).await?;
    let diff = before.diff(&after, DiffMode::Full);

    if let Err(e) = db.execute_in_transaction(&up.statements).await {
        return Ok(VerifyOutcome::Failed(format!("re-applying up: {}", e)));
    }
    Ok(if diff.is_empty() {
        VerifyOutcome::Passed
    } else {
        VerifyOutcome::Mismatch(diff)
    })
}

/// Apply every Up in order to an empty database and snapshot the result.
pub async fn replay(ledger: &Ledger) -> LedgerResult<SchemaSnapshot> {
    let db = DuckDbBackend::in_memory()?;
    let renderer = renderer();
    for migration in ledger.iter() {
        run(&db, &renderer, migration, Direction::Up).await?;
    }
    log::debug!("Replayed {} migrations", ledger.len());
    Ok(db.capture_snapshot(&[]).await?)
}

/// Replay the ledger and compare with the declared snapshot.
///
/// Returns the differences; empty means the ledger reaches `expected`.
pub async fn check(
    ledger: &Ledger,
    expected: &SchemaSnapshot,
    mode: DiffMode,
) -> LedgerResult<Vec<String>> {
    let actual = replay(ledger).await?;
    Ok(expected.diff(&actual, mode))
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod tests;
