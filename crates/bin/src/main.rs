use clap::Parser;
use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod commands;
mod output;
mod session;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("orderable=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match &cli.command {
        Commands::Seed(args) => commands::seed::run(args, format).await,
        Commands::List(args) => commands::list::run(args, format).await,
        Commands::Move(args) => commands::reorder::run_move(args, format).await,
        Commands::MoveToGroup(args) => commands::reorder::run_move_to_group(args, format).await,
        Commands::Rebalance(args) => commands::maintain::rebalance(args, format).await,
        Commands::Backfill(args) => commands::maintain::backfill(args, format).await,
        Commands::Info(args) => commands::info::run(args, format).await,
    }
}
