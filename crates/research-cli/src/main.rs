//! Command-line interface for stock-research

mod bootstrap;
mod fundamentals;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "research-cli")]
#[command(about = "Local model runtime and fundamentals tooling for stock research", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install, start, and warm the local model runtime
    Bootstrap(bootstrap::BootstrapArgs),
    /// Analyze a financial snapshot
    Fundamentals(fundamentals::FundamentalsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    research_utils::init_tracing();

    let cli = Cli::parse();
    info!("Starting research-cli");

    match cli.command {
        Commands::Bootstrap(args) => bootstrap::run(args).await,
        Commands::Fundamentals(args) => fundamentals::run(&args),
    }
}
