//! Down command implementation - reverts applied migrations

use anyhow::Result;
use sf_core::{Direction, Reversibility};
use sf_ledger::{DownTarget, Runner};

use crate::cli::{DownArgs, GlobalArgs};
use crate::commands::common::{print_plan, report_line, runner_error};
use crate::context::RuntimeContext;

/// Execute the down command
pub(crate) async fn execute(args: &DownArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let db = ctx.connect()?;
    let runner = Runner::new(&db, &ctx.ledger, &ctx.config);
    let target = down_target(args);

    if args.dry_run {
        let plan = runner.plan_down(&target).await.map_err(runner_error)?;
        if plan.is_empty() {
            println!("Nothing to revert.");
            return Ok(());
        }
        for migration in &plan {
            if let Reversibility::Irreversible(reason) = migration.reversibility() {
                println!(
                    "-- {} is irreversible ({}); only its history entry would be removed",
                    migration.id, reason
                );
            }
        }
        let units = runner
            .render_plan(&plan, Direction::Down)
            .map_err(runner_error)?;
        print_plan(&units);
        return Ok(());
    }

    let reports = runner
        .down(&target, args.allow_irreversible)
        .await
        .map_err(runner_error)?;
    if reports.is_empty() {
        println!("Nothing to revert.");
        return Ok(());
    }

    println!("Reverted {} migrations:", reports.len());
    for report in &reports {
        println!("{}", report_line(report));
    }
    Ok(())
}

fn down_target(args: &DownArgs) -> DownTarget {
    match (&args.to, args.steps) {
        (Some(to), _) => DownTarget::To(to.clone()),
        (None, Some(steps)) => DownTarget::Steps(steps),
        (None, None) => DownTarget::default(),
    }
}

#[cfg(test)]
#[path = "down_test.rs"]
mod tests;
