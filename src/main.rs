use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cache;
mod cli;
mod config;
mod error;
mod limiter;
mod output;
mod place;
mod planner;
mod runner;
mod search;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing - only show logs with --verbose
    let filter = if cli.verbose {
        EnvFilter::new("daytrip=debug")
    } else {
        EnvFilter::new("daytrip=warn")
    };

    // Logs go to stderr so stdout stays a clean candidate list
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan(args) => cli::plan::execute(args, &cli.config).await,
        Commands::Categories(args) => cli::categories::execute(args, &cli.config),
        Commands::Schema => cli::schema::execute(),
    }
}
