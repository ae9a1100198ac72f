//! Show the weights a distribution would use, without allocating.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use wd_core::{DistributionMode, check_batch, resolve_weights};

use super::util::{CliScorer, block_on, load_entries};
use crate::Config;

#[derive(Debug, Args)]
pub struct WeightsArgs {
    /// JSON file with the entries to score (`-` for stdin).
    #[arg(short, long)]
    pub input: PathBuf,

    /// How to weight entries: equal or smart.
    #[arg(short, long, default_value = "smart")]
    pub mode: DistributionMode,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write>(writer: &mut W, args: &WeightsArgs, config: &Config) -> Result<()> {
    let entries = load_entries(&args.input)?;
    check_batch(&entries, &config.allocation())
        .with_context(|| format!("cannot score entries from {}", args.input.display()))?;
    let scorer = CliScorer::from_config(config)?;
    let resolved = block_on(resolve_weights(&entries, args.mode, &scorer))?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&resolved)?)?;
        return Ok(());
    }

    writeln!(writer, "Weights ({:?}):", resolved.source)?;
    for (entry, weight) in entries.iter().zip(&resolved.weights) {
        writeln!(
            writer,
            "- {} {} \"{}\": {}",
            entry.id,
            entry.group_key,
            entry.label,
            weight.value()
        )?;
    }
    if let Some(warning) = &resolved.warning {
        writeln!(writer, "Warning: {warning}")?;
    }
    Ok(())
}
