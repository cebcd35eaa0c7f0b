//! Verify command implementation - round-trips every migration

use anyhow::Result;
use sf_ledger::{verify_round_trip, VerifyOutcome, VerifyReport};

use crate::cli::{GlobalArgs, VerifyArgs};
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Execute the verify command
pub(crate) async fn execute(args: &VerifyArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let reports = verify_round_trip(&ctx.ledger, args.only.as_deref()).await?;

    for report in &reports {
        println!("{}", outcome_line(report));
    }

    let failures = reports.iter().filter(|r| r.outcome.is_failure()).count();
    let passed = reports
        .iter()
        .filter(|r| r.outcome == VerifyOutcome::Passed)
        .count();
    println!();
    println!(
        "Verified {} migrations: {} passed, {} skipped, {} failed",
        reports.len(),
        passed,
        reports.len() - passed - failures,
        failures
    );
    if reports.len() < ctx.ledger.len() && args.only.is_none() {
        println!(
            "Stopped early; {} migrations were not checked",
            ctx.ledger.len() - reports.len()
        );
    }

    if failures > 0 {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn outcome_line(report: &VerifyReport) -> String {
    match &report.outcome {
        VerifyOutcome::Passed => format!("  ✓ {}", report.id),
        VerifyOutcome::Skipped(reason) => format!("  - {} skipped: {}", report.id, reason),
        VerifyOutcome::Unsupported(message) => {
            format!("  ✗ {} unsupported: {}", report.id, message)
        }
        VerifyOutcome::Failed(message) => format!("  ✗ {} failed: {}", report.id, message),
        VerifyOutcome::Mismatch(diff) => {
            let mut line = format!("  ✗ {} down did not restore the prior state:", report.id);
            for difference in diff {
                line.push_str(&format!("\n      {}", difference));
            }
            line
        }
    }
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod tests;
