//! Render command implementation - prints a migration's SQL

use anyhow::{Context, Result};
use sf_core::{Dialect, Direction, Reversibility};
use sf_sql::SqlRenderer;

use crate::cli::{GlobalArgs, RenderArgs};
use crate::commands::common::print_statements;
use crate::context::RuntimeContext;

/// Execute the render command
pub(crate) async fn execute(args: &RenderArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;
    let migration = ctx.ledger.find(&args.migration)?;

    let direction = if args.down {
        Direction::Down
    } else {
        Direction::Up
    };
    let dialect: Dialect = args.dialect.map(Dialect::from).unwrap_or(ctx.config.dialect);

    let renderer = SqlRenderer::for_dialect(dialect);
    let plan = renderer
        .render_migration(migration, direction)
        .with_context(|| format!("Failed to render {} ({})", migration.id, direction))?;

    println!("-- {} ({}, {})", migration.id, direction, renderer.dialect_name());
    let reversibility = migration.reversibility();
    if direction == Direction::Down && reversibility != Reversibility::Reversible {
        println!("-- {}", reversibility);
    }
    print_statements(&plan);
    Ok(())
}
