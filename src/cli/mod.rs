//! Command-line interface.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "skillsmith", version, about = "Resolve skill catalogs and compile agent plugins")]
pub struct Cli {
    /// Config file replacing the global and project layers
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Primary source URL or local path
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Project directory (defaults to the discovered root)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub robot: bool,

    #[command(subcommand)]
    pub command: Commands,
}
