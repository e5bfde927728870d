mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod watermark;
mod workflow;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::run::{self as run_cmd, RunArgs};
use crate::error::AppResult;

#[derive(Parser)]
#[command(
    name = "ackbot",
    author,
    version,
    about = "Acknowledge, assign and triage new Jira tickets"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reply to, assign and transition new unassigned tickets (default).
    Run(RunArgs),
    /// Inspect the resolved configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing("info");

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_cmd::run(args).await,
        Commands::Config(args) => config_cmd::run(args.command),
    }
}

/// Reads `RUST_LOG`, then `LOG_LEVEL`, falling back to `default_level`.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
