//! Shared utilities for CLI commands.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use wd_core::{
    ComplexityScore, ComplexityScorer, ScoreError, ScoreRequest, TimeEntry, UnavailableScorer,
};
use wd_llm::{ClaudeScorer, Client};

use crate::Config;

/// Entries file layout: a bare array or `{"entries": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EntriesFile {
    List(Vec<TimeEntry>),
    Wrapped { entries: Vec<TimeEntry> },
}

/// Reads time entries from a JSON file, or stdin when `path` is `-`.
pub fn load_entries(path: &Path) -> Result<Vec<TimeEntry>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read entries from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    parse_entries(&raw).with_context(|| format!("invalid entries in {}", path.display()))
}

fn parse_entries(raw: &str) -> Result<Vec<TimeEntry>> {
    let file: EntriesFile = serde_json::from_str(raw)?;
    Ok(match file {
        EntriesFile::List(entries) | EntriesFile::Wrapped { entries } => entries,
    })
}

/// Scorer chosen from configuration.
#[derive(Debug)]
pub enum CliScorer {
    Claude(ClaudeScorer),
    Unavailable(UnavailableScorer),
}

impl CliScorer {
    /// Uses Claude when an API key is configured.
    ///
    /// A missing key is not an error: smart mode then falls back to
    /// heuristic weights and says so.
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(api_key) = config.api_key() else {
            return Ok(Self::Unavailable(UnavailableScorer::new(
                "no API key configured (set WD_API_KEY or api_key in config.toml)",
            )));
        };
        let client = Client::with_timeout(api_key, Duration::from_secs(config.timeout_secs))
            .context("failed to create LLM client")?;
        Ok(Self::Claude(ClaudeScorer::new(client, config.model.clone())))
    }
}

impl ComplexityScorer for CliScorer {
    async fn score(&self, batch: &[ScoreRequest]) -> Result<Vec<ComplexityScore>, ScoreError> {
        match self {
            Self::Claude(scorer) => scorer.score(batch).await,
            Self::Unavailable(scorer) => scorer.score(batch).await,
        }
    }
}

/// Runs a future to completion on a fresh runtime.
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    Ok(runtime.block_on(future))
}
