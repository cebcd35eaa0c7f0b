//! Status command implementation

use anyhow::{Context, Result};
use sf_ledger::{MigrationState, Runner, StatusEntry};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{print_table, runner_error};
use crate::context::RuntimeContext;

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let db = ctx.connect()?;
    let runner = Runner::new(&db, &ctx.ledger, &ctx.config);
    let entries = runner.status().await.map_err(runner_error)?;

    match args.output {
        StatusOutput::Json => {
            let json =
                serde_json::to_string_pretty(&entries).context("Failed to serialize status")?;
            println!("{}", json);
        }
        StatusOutput::Table => {
            if entries.is_empty() {
                println!("No migrations found.");
                return Ok(());
            }
            print_table(
                &["ID", "STATE", "REVERSIBILITY", "APPLIED AT"],
                &status_rows(&entries),
            );
            println!();
            println!("{}", summary(&entries));
        }
    }
    Ok(())
}

fn status_rows(entries: &[StatusEntry]) -> Vec<Vec<String>> {
    entries
        .iter()
        .map(|e| {
            vec![
                e.id.clone(),
                e.state.to_string(),
                e.reversibility
                    .as_ref()
                    .map(|r| r.label().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                e.applied_at.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect()
}

fn summary(entries: &[StatusEntry]) -> String {
    let count = |state: MigrationState| entries.iter().filter(|e| e.state == state).count();
    let mut parts = vec![
        format!("{} applied", count(MigrationState::Applied)),
        format!("{} pending", count(MigrationState::Pending)),
    ];
    for state in [MigrationState::Modified, MigrationState::Missing] {
        let n = count(state);
        if n > 0 {
            parts.push(format!("{} {}", n, state));
        }
    }
    parts.join(", ")
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
