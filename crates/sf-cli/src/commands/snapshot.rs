//! Snapshot command implementation - records the state the ledger reaches

use anyhow::{Context, Result};
use sf_ledger::replay;

use crate::cli::GlobalArgs;
use crate::context::RuntimeContext;

/// Execute the snapshot command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let snapshot = replay(&ctx.ledger)
        .await
        .context("Failed to replay the ledger")?;

    let path = ctx.snapshot_path();
    snapshot
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let rows: u64 = snapshot.tables.values().map(|t| t.row_count).sum();
    println!(
        "  Wrote {} ({} tables, {} rows after {} migrations)",
        path.display(),
        snapshot.tables.len(),
        rows,
        ctx.ledger.len()
    );
    Ok(())
}
