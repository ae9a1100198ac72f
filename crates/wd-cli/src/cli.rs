//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::distribute::DistributeArgs;
use crate::commands::weights::WeightsArgs;

/// Worklog time distribution.
///
/// Rebalances existing worklog entries so they add up to a target duration,
/// splitting evenly or by estimated task complexity.
#[derive(Debug, Parser)]
#[command(name = "wd", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute new durations that sum exactly to a target.
    Distribute(DistributeArgs),

    /// Show the weights a distribution would use.
    Weights(WeightsArgs),
}
