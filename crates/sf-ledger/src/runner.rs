//! Applies and reverts migration units against a database.
//!
//! Runs are serial: one unit at a time, each inside its own transaction
//! together with its history row unless the unit opts out.

use crate::error::{LedgerError, LedgerResult};
use crate::history::{AppliedMigration, HistoryStore};
use serde::Serialize;
use sf_core::{Config, Direction, Ledger, Migration, Reversibility};
use sf_db::{Database, DbError};
use sf_sql::{RenderPlan, SqlRenderer};
use std::collections::HashMap;
use std::time::Instant;

/// Runner behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Refuse to run when an applied unit's checksum changed
    pub validate_checksums: bool,
    /// Allow pending units older than the latest applied one
    pub allow_out_of_order: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            validate_checksums: true,
            allow_out_of_order: false,
        }
    }
}

impl From<&Config> for RunnerOptions {
    fn from(config: &Config) -> Self {
        Self {
            validate_checksums: config.validate_checksums,
            allow_out_of_order: config.allow_out_of_order,
        }
    }
}

/// State of one unit relative to the history table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Applied,
    Pending,
    /// Applied, but the file changed since
    Modified,
    /// Recorded as applied, but no longer in the ledger
    Missing,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Modified => write!(f, "modified"),
            MigrationState::Missing => write!(f, "missing"),
        }
    }
}

/// One line of `status()`
#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub id: String,
    pub state: MigrationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reversibility: Option<Reversibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How far to revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownTarget {
    /// Revert the last N applied units
    Steps(usize),
    /// Revert every applied unit after this id or name
    To(String),
}

impl Default for DownTarget {
    fn default() -> Self {
        DownTarget::Steps(1)
    }
}

/// Outcome of running one unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub id: String,
    pub direction: Direction,
    /// Statements executed
    pub statements: usize,
    /// Operations the engine has no equivalent for
    pub skipped: Vec<String>,
    pub execution_ms: u64,
    /// Reverted by removing the history row only
    pub forced: bool,
}

/// Rendered SQL for one unit, without executing it
#[derive(Debug, Clone)]
pub struct PlannedUnit<'a> {
    pub migration: &'a Migration,
    pub direction: Direction,
    pub plan: RenderPlan,
}

/// Applies and reverts units of a [`Ledger`]
pub struct Runner<'a> {
    db: &'a dyn Database,
    ledger: &'a Ledger,
    history: HistoryStore,
    renderer: SqlRenderer,
    options: RunnerOptions,
}

impl<'a> Runner<'a> {
    /// Create a runner for a project's configuration.
    ///
    /// Statements are rendered for the engine that executes them, not for
    /// the project's review dialect.
    pub fn new(db: &'a dyn Database, ledger: &'a Ledger, config: &Config) -> Self {
        Self {
            db,
            ledger,
            history: HistoryStore::new(config.history.clone()),
            renderer: SqlRenderer::for_dialect(config.database.db_type.dialect()),
            options: RunnerOptions::from(config),
        }
    }

    /// Override the runner options
    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    /// The history store in use
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Every ledger unit with its state, followed by recorded ids the
    /// ledger no longer contains.
    pub async fn status(&self) -> LedgerResult<Vec<StatusEntry>> {
        let applied = self.history.applied(self.db).await?;
        let by_id: HashMap<&str, &AppliedMigration> =
            applied.iter().map(|a| (a.id.as_str(), a)).collect();

        let mut entries: Vec<StatusEntry> = self
            .ledger
            .iter()
            .map(|m| {
                let record = by_id.get(m.id.as_str());
                let state = match record {
                    None => MigrationState::Pending,
                    Some(r) if r.checksum != m.checksum() => MigrationState::Modified,
                    Some(_) => MigrationState::Applied,
                };
                StatusEntry {
                    id: m.id.to_string(),
                    state,
                    reversibility: Some(m.reversibility()),
                    applied_at: record.map(|r| r.applied_at.clone()),
                    description: m.description.clone(),
                }
            })
            .collect();

        entries.extend(
            applied
                .iter()
                .filter(|a| self.ledger.get(&a.id).is_none())
                .map(|a| StatusEntry {
                    id: a.id.clone(),
                    state: MigrationState::Missing,
                    reversibility: None,
                    applied_at: Some(a.applied_at.clone()),
                    description: None,
                }),
        );
        Ok(entries)
    }

    /// Pending units in order, up to and including `target`.
    pub async fn plan_up(&self, target: Option<&str>) -> LedgerResult<Vec<&'a Migration>> {
        let applied = self.history.applied(self.db).await?;
        self.check_drift(&applied, self.ledger.iter())?;

        for record in applied.iter().filter(|a| self.ledger.get(&a.id).is_none()) {
            log::warn!(
                "Migration {} is recorded as applied but has no file in the ledger",
                record.id
            );
        }

        let limit = match target {
            Some(t) => Some(self.ledger.find(t)?.id.as_str()),
            None => None,
        };
        let latest = applied.iter().map(|a| a.id.as_str()).max();

        let mut plan = Vec::new();
        for migration in self.ledger.iter() {
            if limit.is_some_and(|l| migration.id.as_str() > l) {
                break;
            }
            if applied.iter().any(|a| a.id == migration.id.as_str()) {
                continue;
            }
            if let Some(latest) = latest.filter(|l| migration.id.as_str() < *l) {
                if !self.options.allow_out_of_order {
                    return Err(LedgerError::OutOfOrder {
                        id: migration.id.to_string(),
                        latest: latest.to_string(),
                    });
                }
                log::warn!(
                    "Applying {} out of order (latest applied is {})",
                    migration.id,
                    latest
                );
            }
            plan.push(migration);
        }
        Ok(plan)
    }

    /// Apply pending units up to and including `target`.
    pub async fn up(&self, target: Option<&str>) -> LedgerResult<Vec<UnitReport>> {
        let plan = self.plan_up(target).await?;
        if plan.is_empty() {
            return Ok(Vec::new());
        }
        self.history.ensure(self.db).await?;

        let mut reports = Vec::with_capacity(plan.len());
        for migration in plan {
            reports.push(self.apply(migration).await?);
        }
        Ok(reports)
    }

    /// Applied units to revert, newest first.
    pub async fn plan_down(&self, target: &DownTarget) -> LedgerResult<Vec<&'a Migration>> {
        let applied = self.history.applied(self.db).await?;

        let selected: Vec<&AppliedMigration> = match target {
            DownTarget::Steps(n) => applied.iter().rev().take(*n).collect(),
            DownTarget::To(t) => {
                let id = match self.ledger.find(t) {
                    Ok(m) => m.id.to_string(),
                    // A recorded id whose file was removed is still a valid stop point
                    Err(_) if applied.iter().any(|a| a.id == *t) => t.clone(),
                    Err(e) => return Err(e.into()),
                };
                if !applied.iter().any(|a| a.id == id) {
                    return Err(LedgerError::TargetNotApplied { id });
                }
                applied.iter().rev().take_while(|a| a.id != id).collect()
            }
        };

        let mut plan = Vec::with_capacity(selected.len());
        for record in selected {
            let migration = self
                .ledger
                .get(&record.id)
                .ok_or_else(|| LedgerError::MissingFromLedger {
                    id: record.id.clone(),
                })?;
            plan.push(migration);
        }
        self.check_drift(&applied, plan.iter().copied())?;
        Ok(plan)
    }

    /// Revert applied units. Irreversible units are refused unless
    /// `allow_irreversible`, in which case only their history row is removed.
    pub async fn down(
        &self,
        target: &DownTarget,
        allow_irreversible: bool,
    ) -> LedgerResult<Vec<UnitReport>> {
        let plan = self.plan_down(target).await?;

        // Refuse before touching anything
        if !allow_irreversible {
            if let Some(m) = plan
                .iter()
                .find(|m| matches!(m.reversibility(), Reversibility::Irreversible(_)))
            {
                return Err(LedgerError::IrreversibleRevert {
                    id: m.id.to_string(),
                    reason: m.reversibility().reason().unwrap_or_default().to_string(),
                });
            }
        }

        let mut reports = Vec::with_capacity(plan.len());
        for migration in plan {
            reports.push(self.revert(migration).await?);
        }
        Ok(reports)
    }

    /// Render the SQL each unit would run, in order.
    pub fn render_plan(
        &self,
        migrations: &[&'a Migration],
        direction: Direction,
    ) -> LedgerResult<Vec<PlannedUnit<'a>>> {
        migrations
            .iter()
            .map(|&m| -> LedgerResult<PlannedUnit<'a>> {
                Ok(PlannedUnit {
                    migration: m,
                    direction,
                    plan: self.renderer.render_migration(m, direction)?,
                })
            })
            .collect()
    }

    async fn apply(&self, migration: &Migration) -> LedgerResult<UnitReport> {
        let plan = self.renderer.render_migration(migration, Direction::Up)?;
        log_skipped(migration, &plan);
        log::debug!(
            "Applying {} ({} statements)",
            migration.id,
            plan.statements.len()
        );

        let applied_at = chrono::Utc::now().to_rfc3339();
        let record = self.history.insert_sql(migration, &applied_at);
        let started = Instant::now();

        if migration.transactional {
            let mut statements = plan.statements.clone();
            statements.push(record);
            self.db
                .execute_in_transaction(&statements)
                .await
                .map_err(|e| failed(migration, Direction::Up, e))?;
        } else {
            self.run_non_transactional(migration, Direction::Up, &plan.statements)
                .await?;
            self.db.execute(&record).await?;
        }

        let execution_ms = started.elapsed().as_millis() as u64;
        self.history
            .record_duration(self.db, migration.id.as_str(), execution_ms)
            .await?;

        Ok(UnitReport {
            id: migration.id.to_string(),
            direction: Direction::Up,
            statements: plan.statements.len(),
            skipped: plan.skipped,
            execution_ms,
            forced: false,
        })
    }

    async fn revert(&self, migration: &Migration) -> LedgerResult<UnitReport> {
        let unrecord = self.history.delete_sql(migration.id.as_str());
        let started = Instant::now();

        if let Reversibility::Irreversible(reason) = migration.reversibility() {
            log::warn!(
                "Removing history entry for irreversible migration {} without running SQL ({})",
                migration.id,
                reason
            );
            self.db
                .execute_in_transaction(&[unrecord])
                .await
                .map_err(|e| failed(migration, Direction::Down, e))?;
            return Ok(UnitReport {
                id: migration.id.to_string(),
                direction: Direction::Down,
                statements: 0,
                skipped: Vec::new(),
                execution_ms: started.elapsed().as_millis() as u64,
                forced: true,
            });
        }
        if let Reversibility::Partial(reason) = migration.reversibility() {
            log::warn!(
                "Migration {} is only partially reversible: {}",
                migration.id,
                reason
            );
        }

        let plan = self.renderer.render_migration(migration, Direction::Down)?;
        log_skipped(migration, &plan);
        log::debug!(
            "Reverting {} ({} statements)",
            migration.id,
            plan.statements.len()
        );

        if migration.transactional {
            let mut statements = plan.statements.clone();
            statements.push(unrecord);
            self.db
                .execute_in_transaction(&statements)
                .await
                .map_err(|e| failed(migration, Direction::Down, e))?;
        } else {
            self.run_non_transactional(migration, Direction::Down, &plan.statements)
                .await?;
            self.db.execute(&unrecord).await?;
        }

        Ok(UnitReport {
            id: migration.id.to_string(),
            direction: Direction::Down,
            statements: plan.statements.len(),
            skipped: plan.skipped,
            execution_ms: started.elapsed().as_millis() as u64,
            forced: false,
        })
    }

    async fn run_non_transactional(
        &self,
        migration: &Migration,
        direction: Direction,
        statements: &[String],
    ) -> LedgerResult<()> {
        log::warn!(
            "Running {} ({}) outside a transaction; a failure leaves partial changes",
            migration.id,
            direction
        );
        self.db.execute_each(statements).await.map_err(|e| {
            let completed = e.failed_statement().map_or(0, |i| i - 1);
            LedgerError::ManualCleanupRequired {
                id: migration.id.to_string(),
                direction: direction.to_string(),
                completed,
                total: statements.len(),
                source: e,
            }
        })
    }

    fn check_drift<'m>(
        &self,
        applied: &[AppliedMigration],
        migrations: impl Iterator<Item = &'m Migration>,
    ) -> LedgerResult<()> {
        if !self.options.validate_checksums {
            return Ok(());
        }
        let recorded: HashMap<&str, &str> = applied
            .iter()
            .map(|a| (a.id.as_str(), a.checksum.as_str()))
            .collect();
        for migration in migrations {
            let Some(checksum) = recorded.get(migration.id.as_str()) else {
                continue;
            };
            let current = migration.checksum();
            if *checksum != current {
                return Err(LedgerError::ChecksumMismatch {
                    id: migration.id.to_string(),
                    recorded: checksum.to_string(),
                    current,
                });
            }
        }
        Ok(())
    }
}

fn failed(migration: &Migration, direction: Direction, source: DbError) -> LedgerError {
    LedgerError::Failed {
        id: migration.id.to_string(),
        direction: direction.to_string(),
        source,
    }
}

fn log_skipped(migration: &Migration, plan: &RenderPlan) {
    for reason in &plan.skipped {
        log::warn!("{}: {}", migration.id, reason);
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
