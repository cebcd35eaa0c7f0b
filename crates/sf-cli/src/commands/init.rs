//! Init command implementation - scaffolds a new Schemaflow project

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::InitArgs;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs) -> Result<()> {
    // Reject names that could cause path traversal or confusing directory names
    if args.name.contains('/')
        || args.name.contains('\\')
        || args.name.contains("..")
        || args.name.starts_with('.')
        || args.name.starts_with('-')
    {
        anyhow::bail!(
            "Invalid project name '{}': must not contain '/', '\\', '..', or start with '.' or '-'",
            args.name
        );
    }

    let project_dir = Path::new(&args.name);

    if project_dir.exists() {
        anyhow::bail!(
            "Directory '{}' already exists. Choose a different project name.",
            args.name
        );
    }

    println!("Creating new Schemaflow project: {}\n", args.name);
    scaffold(project_dir, &args.name, &args.database_path)?;

    println!("  Created schemaflow.yml");
    println!("  Created migrations/");
    println!("  Created .gitignore");
    println!();
    println!("Project '{}' initialized successfully!", args.name);
    println!();
    println!("Next steps:");
    println!("  cd {}", args.name);
    println!("  sf new CreateFirstTable    # Scaffold a migration");
    println!("  sf verify                  # Round-trip every migration");
    println!("  sf up                      # Apply pending migrations");

    Ok(())
}

/// Write the project skeleton into `project_dir`.
pub(crate) fn scaffold(project_dir: &Path, name: &str, database_path: &str) -> Result<()> {
    let migrations_dir = project_dir.join("migrations");
    fs::create_dir_all(&migrations_dir)
        .with_context(|| format!("Failed to create directory: {}", migrations_dir.display()))?;

    // Escape YAML special characters in interpolated values
    let safe_name = name.replace('"', "\\\"");
    let safe_db_path = database_path.replace('"', "\\\"");
    let config_content = format!(
        r#"name: "{name}"

migrations_path: migrations
snapshot_path: schema_snapshot.json
dialect: duckdb

database:
  type: duckdb
  path: "{db_path}"

history:
  schema: sf_meta
  table: schema_migrations

validate_checksums: true
allow_out_of_order: false

# targets:
#   prod:
#     database:
#       type: duckdb
#       path: "/var/lib/content/prod.duckdb"
"#,
        name = safe_name,
        db_path = safe_db_path,
    );
    fs::write(project_dir.join("schemaflow.yml"), config_content)
        .context("Failed to write schemaflow.yml")?;

    let gitignore = "target/\n*.duckdb\n*.duckdb.wal\n";
    fs::write(project_dir.join(".gitignore"), gitignore).context("Failed to write .gitignore")?;

    Ok(())
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
