//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Schemaflow - reversible, auditable schema migrations
#[derive(Parser, Debug)]
#[command(name = "sf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a new project
    Init(InitArgs),

    /// Scaffold a new timestamped migration
    New(NewArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),

    /// Apply pending migrations
    Up(UpArgs),

    /// Revert applied migrations
    Down(DownArgs),

    /// Print the SQL a migration renders to
    Render(RenderArgs),

    /// Check migrations for risky or ambiguous constructs
    Lint,

    /// Round-trip every migration on a scratch database
    Verify(VerifyArgs),

    /// Replay the ledger and compare with the declared snapshot
    Check(CheckArgs),

    /// Replay the ledger and write the declared snapshot
    Snapshot,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name (also the directory created)
    pub name: String,

    /// Database path written to schemaflow.yml
    #[arg(long, default_value = "target/dev.duckdb")]
    pub database_path: String,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Migration name, e.g. AddTimeIdentifierToRelease
    pub name: String,

    /// Also create `<id>/up.sql` and `<id>/down.sql` referenced by the unit
    #[arg(long)]
    pub sql: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Stop after this migration (id or name)
    #[arg(long)]
    pub to: Option<String>,

    /// Print the SQL without executing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Revert every migration applied after this one (id or name)
    #[arg(long, conflicts_with = "steps")]
    pub to: Option<String>,

    /// Number of migrations to revert
    #[arg(long)]
    pub steps: Option<usize>,

    /// Revert irreversible migrations by removing their history row only
    #[arg(long)]
    pub allow_irreversible: bool,

    /// Print the SQL without executing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the render command
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Migration id or name
    pub migration: String,

    /// Render the down operations instead of up
    #[arg(long)]
    pub down: bool,

    /// Override the configured dialect
    #[arg(short, long, value_enum)]
    pub dialect: Option<DialectArg>,
}

/// Dialect choices for rendering
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectArg {
    Duckdb,
    Postgres,
}

impl From<DialectArg> for sf_core::Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Duckdb => sf_core::Dialect::DuckDb,
            DialectArg::Postgres => sf_core::Dialect::Postgres,
        }
    }
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Verify only this migration (id or name); earlier ones are applied first
    #[arg(long)]
    pub only: Option<String>,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Compare tables, columns and indexes only, not row data
    #[arg(long)]
    pub schema_only: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
