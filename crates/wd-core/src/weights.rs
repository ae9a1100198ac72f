//! Weight resolution.
//!
//! Turns a batch of entries into one weight per entry, in entry order.
//! Equal mode is a uniform split. Smart mode asks a [`ComplexityScorer`] and
//! sanitizes whatever comes back; when the scorer fails or answers with
//! nothing usable, weights fall back to a local comment-length heuristic.
//!
//! Resolution never fails. Degradations are logged and reported through
//! [`ResolvedWeights::warning`] so callers can tell a model-guided split
//! from a heuristic one.

use std::collections::HashMap;

use serde::Serialize;

use crate::scorer::{ComplexityScore, ComplexityScorer, ScoreRequest};
use crate::types::{DistributionMode, MAX_WEIGHT, MIN_WEIGHT, NEUTRAL_WEIGHT, TimeEntry, Weight};

/// Comment characters per heuristic weight point.
pub const FALLBACK_CHARS_PER_POINT: usize = 50;

/// Where a set of weights came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    /// Equal mode; every weight is 1.
    Uniform,
    /// Complexity scores from the scorer (vacuously, for an empty smart batch).
    Scored,
    /// Local comment-length heuristic after a scoring failure.
    Fallback,
}

/// Weights for a batch plus how they were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedWeights {
    /// One weight per entry, same order as the entries.
    pub weights: Vec<Weight>,
    pub source: WeightSource,
    /// Ids the scorer left out; they received the neutral weight.
    pub defaulted: Vec<String>,
    /// Non-fatal notice about degraded scoring.
    pub warning: Option<String>,
}

impl ResolvedWeights {
    fn uniform(entries: &[TimeEntry]) -> Self {
        Self {
            weights: entries.iter().map(|e| Weight::uniform(e.id.as_str())).collect(),
            source: WeightSource::Uniform,
            defaulted: Vec::new(),
            warning: None,
        }
    }

    fn fallback(entries: &[TimeEntry], reason: String) -> Self {
        tracing::warn!(
            entries = entries.len(),
            reason = %reason,
            "complexity scoring unavailable, using comment length heuristic"
        );
        Self {
            weights: entries.iter().map(heuristic_weight).collect(),
            source: WeightSource::Fallback,
            defaulted: Vec::new(),
            warning: Some(format!("{reason}; weights estimated from comment length")),
        }
    }

    /// Raw weight values in entry order.
    pub fn values(&self) -> Vec<u8> {
        self.weights.iter().map(Weight::value).collect()
    }

    pub fn is_fallback(&self) -> bool {
        self.source == WeightSource::Fallback
    }
}

/// Resolves one weight per entry according to `mode`.
///
/// The scorer is awaited at most once, and only in smart mode.
pub async fn resolve_weights<S: ComplexityScorer>(
    entries: &[TimeEntry],
    mode: DistributionMode,
    scorer: &S,
) -> ResolvedWeights {
    if mode == DistributionMode::Equal {
        return ResolvedWeights::uniform(entries);
    }
    if entries.is_empty() {
        // Nothing to score; the allocator rejects empty batches.
        return ResolvedWeights {
            weights: Vec::new(),
            source: WeightSource::Scored,
            defaulted: Vec::new(),
            warning: None,
        };
    }

    let batch: Vec<ScoreRequest> = entries.iter().map(ScoreRequest::from).collect();
    let resolved = match scorer.score(&batch).await {
        Ok(scores) => apply_scores(entries, &scores).unwrap_or_else(|| {
            ResolvedWeights::fallback(
                entries,
                "scoring response contained no usable scores".to_string(),
            )
        }),
        Err(err) => ResolvedWeights::fallback(entries, format!("complexity scoring failed: {err}")),
    };

    tracing::debug!(
        source = ?resolved.source,
        weights = ?resolved.values(),
        "resolved weights"
    );
    resolved
}

/// Maps scores onto entries, or `None` if no requested id got a usable score.
fn apply_scores(entries: &[TimeEntry], scores: &[ComplexityScore]) -> Option<ResolvedWeights> {
    let mut by_id: HashMap<&str, f64> = HashMap::new();
    for score in scores.iter().filter(|s| s.score.is_finite()) {
        by_id.entry(score.id.as_str()).or_insert(score.score);
    }

    if !entries.iter().any(|e| by_id.contains_key(e.id.as_str())) {
        return None;
    }

    let mut defaulted = Vec::new();
    let weights = entries
        .iter()
        .map(|entry| match by_id.get(entry.id.as_str()) {
            Some(&score) => Weight::clamped(entry.id.as_str(), score),
            None => {
                defaulted.push(entry.id.clone());
                Weight::clamped(entry.id.as_str(), f64::from(NEUTRAL_WEIGHT))
            }
        })
        .collect();

    let warning = if defaulted.is_empty() {
        None
    } else {
        tracing::warn!(
            missing = ?defaulted,
            "scoring response omitted entries, using neutral weight"
        );
        Some(format!(
            "{} of {} entries missing from scoring response; assigned weight {NEUTRAL_WEIGHT}",
            defaulted.len(),
            entries.len()
        ))
    };

    Some(ResolvedWeights {
        weights,
        source: WeightSource::Scored,
        defaulted,
        warning,
    })
}

/// Scores an entry from the length of its comment.
///
/// Monotonic in length: one point per [`FALLBACK_CHARS_PER_POINT`]
/// characters on top of the minimum, capped at the maximum weight.
pub fn heuristic_weight(entry: &TimeEntry) -> Weight {
    let chars = entry.comment_text.trim().chars().count();
    let points = u8::try_from(chars / FALLBACK_CHARS_PER_POINT)
        .unwrap_or(u8::MAX)
        .min(MAX_WEIGHT - MIN_WEIGHT);
    Weight::clamped(entry.id.as_str(), f64::from(MIN_WEIGHT + points))
}
