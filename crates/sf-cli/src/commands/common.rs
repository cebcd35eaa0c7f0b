//! Shared utilities for CLI commands

use sf_ledger::{LedgerError, PlannedUnit, UnitReport};
use sf_sql::RenderPlan;
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: main.rs exits with the code and prints nothing for it
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Exit code for failures while executing SQL against the database
pub(crate) const EXIT_DATABASE: i32 = 4;

/// Report a runner error.
///
/// Errors raised while executing SQL are printed here and exit with
/// [`EXIT_DATABASE`]; everything else is passed on to main.
pub(crate) fn runner_error(err: LedgerError) -> anyhow::Error {
    if err.is_database_error() {
        eprintln!("Error: {}", err);
        ExitCode(EXIT_DATABASE).into()
    } else {
        err.into()
    }
}

/// Calculate column widths for a table.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Print a formatted table to stdout.
///
/// Prints a left-aligned header row, a separator line of dashes, and each
/// data row. Columns are separated by two spaces.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

/// Print the SQL of a dry run, one block per unit.
pub(crate) fn print_plan(units: &[PlannedUnit<'_>]) {
    for unit in units {
        println!("-- {} ({})", unit.migration.id, unit.direction);
        print_statements(&unit.plan);
        println!();
    }
}

/// Print rendered statements, each terminated by `;`.
pub(crate) fn print_statements(plan: &RenderPlan) {
    for statement in &plan.statements {
        println!("{};", statement.trim_end().trim_end_matches(';'));
    }
    for skipped in &plan.skipped {
        println!("-- skipped: {}", skipped);
    }
}

/// One line summarising a unit that ran.
pub(crate) fn report_line(report: &UnitReport) -> String {
    let mut line = if report.forced {
        format!("  ✓ {} (history entry removed, no SQL run)", report.id)
    } else {
        format!(
            "  ✓ {} ({} statements, {}ms)",
            report.id, report.statements, report.execution_ms
        )
    };
    for skipped in &report.skipped {
        line.push_str(&format!("\n      skipped: {}", skipped));
    }
    line
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
