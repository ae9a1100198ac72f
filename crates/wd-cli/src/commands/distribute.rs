//! Distribute a target duration across worklog entries.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use wd_core::{Distribution, DistributionMode, RemainderPolicy, WeightSource, distribute};

use super::util::{CliScorer, block_on, load_entries};
use crate::Config;

#[derive(Debug, Args)]
pub struct DistributeArgs {
    /// JSON file with the entries to rebalance (`-` for stdin).
    #[arg(short, long)]
    pub input: PathBuf,

    /// Target total in hours, greater than 0 and at most 24.
    #[arg(long)]
    pub hours: f64,

    /// How to weight entries: equal or smart.
    #[arg(short, long, default_value = "equal")]
    pub mode: DistributionMode,

    /// Remainder policy: weight or fraction. Overrides the config file.
    #[arg(long)]
    pub policy: Option<RemainderPolicy>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct JsonDistribution<'a> {
    target_hours: f64,
    target_minutes: u64,
    mode: DistributionMode,
    #[serde(flatten)]
    distribution: &'a Distribution,
}

pub fn run<W: Write>(writer: &mut W, args: &DistributeArgs, config: &Config) -> Result<()> {
    let entries = load_entries(&args.input)?;
    let mut allocation = config.allocation();
    if let Some(policy) = args.policy {
        allocation.remainder_policy = policy;
    }
    let scorer = CliScorer::from_config(config)?;

    let distribution = block_on(distribute(
        &entries,
        args.hours,
        args.mode,
        &scorer,
        &allocation,
    ))?
    .context("distribution failed")?;

    if args.json {
        let output = JsonDistribution {
            target_hours: args.hours,
            target_minutes: distribution.total_minutes(),
            mode: args.mode,
            distribution: &distribution,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        write!(writer, "{}", format_distribution(&distribution, args.hours, args.mode))?;
    }
    Ok(())
}

/// Renders a distribution for humans.
pub fn format_distribution(
    distribution: &Distribution,
    target_hours: f64,
    mode: DistributionMode,
) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "Target: {target_hours:.2}h ({} min) across {} entries",
        distribution.total_minutes(),
        distribution.results.len()
    )
    .unwrap();
    writeln!(
        out,
        "Mode: {mode} (weights: {})",
        source_label(distribution)
    )
    .unwrap();
    for (result, weight) in distribution.results.iter().zip(&distribution.weights.weights) {
        let before = i64::try_from(result.new_minutes).unwrap_or(i64::MAX) - result.delta_minutes;
        writeln!(
            out,
            "- {} {} \"{}\": {before} -> {} min ({:+}) [weight {}]",
            result.entry_id,
            result.group_key,
            result.label,
            result.new_minutes,
            result.delta_minutes,
            weight.value()
        )
        .unwrap();
    }
    if let Some(warning) = distribution.warning() {
        writeln!(out, "Warning: {warning}").unwrap();
    }
    out
}

fn source_label(distribution: &Distribution) -> &'static str {
    match distribution.weights.source {
        WeightSource::Uniform => "uniform",
        WeightSource::Scored => "scored",
        WeightSource::Fallback => "fallback",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use wd_core::{AllocationConfig, TimeEntry, UnavailableScorer};

    fn entries() -> Vec<TimeEntry> {
        vec![
            TimeEntry {
                id: "10001".to_string(),
                group_key: "PROJ-1".to_string(),
                label: "Login form".to_string(),
                comment_text: "Reworked validation and error states for the login form".to_string(),
                current_seconds: 7200,
            },
            TimeEntry {
                id: "10002".to_string(),
                group_key: "PROJ-2".to_string(),
                label: "Standup".to_string(),
                comment_text: String::new(),
                current_seconds: 1800,
            },
            TimeEntry {
                id: "10003".to_string(),
                group_key: "PROJ-1".to_string(),
                label: "Code review".to_string(),
                comment_text: "Reviewed".to_string(),
                current_seconds: 3600,
            },
        ]
    }

    fn run_distribution(mode: DistributionMode, hours: f64) -> Distribution {
        let scorer = UnavailableScorer::new("no API key configured");
        block_on(distribute(
            &entries(),
            hours,
            mode,
            &scorer,
            &AllocationConfig::default(),
        ))
        .unwrap()
        .unwrap()
    }

    #[test]
    fn format_equal_distribution() {
        let distribution = run_distribution(DistributionMode::Equal, 8.07);
        let output = format_distribution(&distribution, 8.07, DistributionMode::Equal);
        assert_snapshot!(output, @r#"
        Target: 8.07h (484 min) across 3 entries
        Mode: equal (weights: uniform)
        - 10001 PROJ-1 "Login form": 120 -> 162 min (+42) [weight 1]
        - 10002 PROJ-2 "Standup": 30 -> 161 min (+131) [weight 1]
        - 10003 PROJ-1 "Code review": 60 -> 161 min (+101) [weight 1]
        "#);
    }

    #[test]
    fn format_fallback_distribution_includes_warning() {
        let distribution = run_distribution(DistributionMode::Smart, 4.0);
        let output = format_distribution(&distribution, 4.0, DistributionMode::Smart);
        assert_snapshot!(output, @r#"
        Target: 4.00h (240 min) across 3 entries
        Mode: smart (weights: fallback)
        - 10001 PROJ-1 "Login form": 120 -> 120 min (+0) [weight 2]
        - 10002 PROJ-2 "Standup": 30 -> 60 min (+30) [weight 1]
        - 10003 PROJ-1 "Code review": 60 -> 60 min (+0) [weight 1]
        Warning: complexity scoring failed: scorer unavailable: no API key configured; weights estimated from comment length
        "#);
    }
}
