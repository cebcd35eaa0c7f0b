//! Up command implementation - applies pending migrations

use anyhow::Result;
use sf_core::Direction;
use sf_ledger::Runner;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common::{print_plan, report_line, runner_error};
use crate::context::RuntimeContext;

/// Execute the up command
pub(crate) async fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let db = ctx.connect()?;
    let runner = Runner::new(&db, &ctx.ledger, &ctx.config);

    if args.dry_run {
        let plan = runner
            .plan_up(args.to.as_deref())
            .await
            .map_err(runner_error)?;
        if plan.is_empty() {
            println!("Database is up to date.");
            return Ok(());
        }
        let units = runner
            .render_plan(&plan, Direction::Up)
            .map_err(runner_error)?;
        print_plan(&units);
        return Ok(());
    }

    let reports = runner.up(args.to.as_deref()).await.map_err(runner_error)?;
    if reports.is_empty() {
        println!("Database is up to date.");
        return Ok(());
    }

    println!("Applied {} migrations:", reports.len());
    for report in &reports {
        println!("{}", report_line(report));
    }
    Ok(())
}
