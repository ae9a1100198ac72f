//! The complexity scoring capability the weight resolver depends on.
//!
//! Scoring is usually backed by a language model behind a network call, so
//! the engine only sees it through [`ComplexityScorer`]. Tests and offline
//! callers plug in their own implementations.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::TimeEntry;

/// One entry as presented to the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRequest {
    pub id: String,
    pub label: String,
    pub comment_text: String,
}

impl From<&TimeEntry> for ScoreRequest {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            id: entry.id.clone(),
            label: entry.label.clone(),
            comment_text: entry.comment_text.clone(),
        }
    }
}

/// A raw score as returned by the scorer.
///
/// Scores are untrusted: they may be fractional, out of range, or refer to
/// ids that were never requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityScore {
    pub id: String,
    pub score: f64,
}

impl ComplexityScore {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Scoring failures. The resolver recovers from all of them.
#[derive(Debug, Error)]
pub enum ScoreError {
    /// The backing service failed.
    #[error("scoring service failed: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with something that is not a score list.
    #[error("malformed scoring response: {0}")]
    Malformed(String),

    /// No scorer is configured.
    #[error("scorer unavailable: {0}")]
    Unavailable(String),
}

/// Estimates relative task size for a batch of entries.
///
/// Expected scale: 1-2 trivial, 3-4 small, 5-6 medium, 7-8 complex,
/// 9-10 very complex. The returned collection is unordered.
pub trait ComplexityScorer: Send + Sync {
    fn score(
        &self,
        batch: &[ScoreRequest],
    ) -> impl Future<Output = Result<Vec<ComplexityScore>, ScoreError>> + Send;
}

/// A scorer that always fails, for callers without a scoring backend.
///
/// Smart mode with this scorer degrades to the local length heuristic.
#[derive(Debug, Clone)]
pub struct UnavailableScorer {
    reason: String,
}

impl UnavailableScorer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ComplexityScorer for UnavailableScorer {
    async fn score(&self, _batch: &[ScoreRequest]) -> Result<Vec<ComplexityScore>, ScoreError> {
        Err(ScoreError::Unavailable(self.reason.clone()))
    }
}
