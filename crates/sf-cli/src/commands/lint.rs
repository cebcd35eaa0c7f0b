//! Lint command implementation

use anyhow::Result;
use sf_ledger::{has_errors, lint, Severity};

use crate::cli::GlobalArgs;
use crate::commands::common::ExitCode;
use crate::context::RuntimeContext;

/// Execute the lint command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let findings = lint(&ctx.ledger, ctx.config.dialect);

    for finding in &findings {
        let marker = match finding.severity {
            Severity::Error => "✗",
            Severity::Warning => "!",
        };
        match &finding.id {
            Some(id) => println!("  {} {} {}: {}", marker, finding.severity, id, finding.message),
            None => println!("  {} {}: {}", marker, finding.severity, finding.message),
        }
    }

    let errors = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    println!();
    println!(
        "Linted {} migrations: {} errors, {} warnings",
        ctx.ledger.len(),
        errors,
        findings.len() - errors
    );

    if has_errors(&findings) {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
