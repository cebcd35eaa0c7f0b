//! Schemaflow CLI - reversible, auditable schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::Cli;
use commands::common::ExitCode;
use commands::{check, down, init, lint, new, render, snapshot, status, up, verify};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = dispatch(&cli).await {
        let code = match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => *code,
            None => {
                eprintln!("Error: {:#}", err);
                1
            }
        };
        std::process::exit(code);
    }
}

/// `--verbose` raises the default filter; `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Init(args) => init::execute(args).await,
        cli::Commands::New(args) => new::execute(args, &cli.global).await,
        cli::Commands::Status(args) => status::execute(args, &cli.global).await,
        cli::Commands::Up(args) => up::execute(args, &cli.global).await,
        cli::Commands::Down(args) => down::execute(args, &cli.global).await,
        cli::Commands::Render(args) => render::execute(args, &cli.global).await,
        cli::Commands::Lint => lint::execute(&cli.global).await,
        cli::Commands::Verify(args) => verify::execute(args, &cli.global).await,
        cli::Commands::Check(args) => check::execute(args, &cli.global).await,
        cli::Commands::Snapshot => snapshot::execute(&cli.global).await,
    }
}
