pub mod categories;
pub mod plan;
pub mod schema;

use crate::place::Anchor;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "daytrip")]
#[command(
    author,
    version,
    about = "Collect and shortlist nearby places for an outing"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file (defaults are used if it does not exist)
    #[arg(short, long, global = true, default_value = "daytrip.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search around an anchor and print a numbered candidate list
    Plan(PlanArgs),

    /// Show the categories that would be searched
    Categories(CategoriesArgs),

    /// Print JSON Schema for config validation
    Schema,
}

#[derive(Parser, Clone)]
pub struct PlanArgs {
    /// Anchor coordinate as "lat,lng"
    #[arg(
        long,
        allow_hyphen_values = true,
        conflicts_with = "location",
        required_unless_present = "location"
    )]
    pub anchor: Option<Anchor>,

    /// Place name to resolve into the anchor (e.g. "홍대입구역")
    #[arg(long)]
    pub location: Option<String>,

    /// Companion type (family, friends, couple, solo)
    #[arg(long, default_value = "solo")]
    pub companion: String,

    /// Search these categories instead of the companion defaults (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Override search radius in meters
    #[arg(long)]
    pub radius: Option<u32>,

    /// Override the number of candidates to keep
    #[arg(long)]
    pub target: Option<usize>,

    /// Override max parallel category searches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Serve searches from a fixture file instead of the API
    #[arg(long, env = "DAYTRIP_FIXTURE")]
    pub fixture: Option<PathBuf>,

    /// Also write JSON and Markdown session reports here
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the session summary as JSON instead of a numbered list
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct CategoriesArgs {
    /// Companion type (family, friends, couple, solo)
    #[arg(long, default_value = "solo")]
    pub companion: String,
}
