//! Check command implementation - replays the ledger against the snapshot

use anyhow::{Context, Result};
use sf_core::{DiffMode, SchemaSnapshot};
use sf_ledger::check;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Execute the check command
pub(crate) async fn execute(args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let snapshot_path = ctx.snapshot_path();
    let expected = SchemaSnapshot::load(&snapshot_path).with_context(|| {
        format!(
            "Failed to load snapshot {}; run `sf snapshot` to create it",
            snapshot_path.display()
        )
    })?;

    let mode = if args.schema_only {
        DiffMode::SchemaOnly
    } else {
        DiffMode::Full
    };
    let differences = check(&ctx.ledger, &expected, mode).await?;

    if differences.is_empty() {
        println!(
            "  ✓ {} migrations reach {}",
            ctx.ledger.len(),
            snapshot_path.display()
        );
        return Ok(());
    }

    println!(
        "  ✗ Replaying {} migrations does not reach {}:",
        ctx.ledger.len(),
        snapshot_path.display()
    );
    for difference in &differences {
        println!("      {}", difference);
    }
    Err(ExitCode(1).into())
}
