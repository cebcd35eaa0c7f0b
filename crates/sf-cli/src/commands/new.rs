//! New command implementation - scaffolds a timestamped migration

use anyhow::{Context, Result};
use chrono::Utc;
use sf_core::MigrationId;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, NewArgs};
use crate::context::RuntimeContext;

/// Execute the new command
pub(crate) async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::load(global)?;

    if let Ok(existing) = ctx.ledger.find(&args.name) {
        anyhow::bail!(
            "A migration named '{}' already exists: {}",
            args.name,
            existing.id
        );
    }

    let id = MigrationId::from_parts(Utc::now(), &args.name)
        .with_context(|| format!("Invalid migration name '{}'", args.name))?;
    if let Some(latest) = ctx.ledger.last().filter(|m| m.id >= id) {
        log::warn!(
            "{} sorts before the latest migration {}; check the system clock",
            id,
            latest.id
        );
    }

    let migrations_dir = ctx.config.migrations_path_absolute(&ctx.root);
    let created = scaffold(&migrations_dir, &id, args.sql)?;
    for path in created {
        let shown = path.strip_prefix(&ctx.root).unwrap_or(path.as_path());
        println!("  Created {}", shown.display());
    }
    Ok(())
}

/// Write the unit file (and its SQL directory with `sql`), returning the
/// paths created.
pub(crate) fn scaffold(
    migrations_dir: &Path,
    id: &MigrationId,
    sql: bool,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(migrations_dir)
        .with_context(|| format!("Failed to create directory: {}", migrations_dir.display()))?;

    let unit_path = migrations_dir.join(format!("{}.yml", id));
    if unit_path.exists() {
        anyhow::bail!("{} already exists", unit_path.display());
    }

    let mut created = Vec::new();
    let body = if sql {
        let sql_dir = migrations_dir.join(id.as_str());
        fs::create_dir_all(&sql_dir)
            .with_context(|| format!("Failed to create directory: {}", sql_dir.display()))?;
        for (file, placeholder) in [
            ("up.sql", "-- Forward change\nSELECT 1;\n"),
            ("down.sql", "-- Undo the forward change\nSELECT 1;\n"),
        ] {
            let path = sql_dir.join(file);
            fs::write(&path, placeholder)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            created.push(path);
        }
        sql_file_template(id)
    } else {
        operations_template(id)
    };

    fs::write(&unit_path, body)
        .with_context(|| format!("Failed to write {}", unit_path.display()))?;
    created.insert(0, unit_path);
    Ok(created)
}

fn operations_template(id: &MigrationId) -> String {
    format!(
        r#"description: "{name}"

# Operations: create_table, drop_table, rename_table, add_column, drop_column,
# rename_column, alter_column, create_index, drop_index, rename_index,
# add_foreign_key, drop_foreign_key, insert_rows, update_rows, delete_rows,
# grant, revoke, sql, sql_file.
#
# Forward-only units leave `down` empty and say why:
# irreversible: "permission grants are forward-only"

up:
  - sql: SELECT 1

down:
  - sql: SELECT 1
"#,
        name = id.name()
    )
}

fn sql_file_template(id: &MigrationId) -> String {
    format!(
        r#"description: "{name}"

up:
  - sql_file: up.sql

down:
  - sql_file: down.sql
"#,
        name = id.name()
    )
}

#[cfg(test)]
#[path = "new_test.rs"]
mod tests;
