//! End-to-end distribution: validate, resolve weights, allocate.

use serde::Serialize;

use crate::allocation::{AllocationConfig, allocate_with, validate_request};
use crate::error::DistributionError;
use crate::scorer::ComplexityScorer;
use crate::types::{AllocationResult, DistributionMode, TimeEntry};
use crate::weights::{ResolvedWeights, resolve_weights};

/// Outcome of a distribution call.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    /// One result per entry, in entry order.
    pub results: Vec<AllocationResult>,
    /// Weights used, and whether scoring degraded.
    pub weights: ResolvedWeights,
}

impl Distribution {
    pub fn total_minutes(&self) -> u64 {
        self.results.iter().map(|r| r.new_minutes).sum()
    }

    /// Results whose duration actually changes.
    pub fn changed(&self) -> impl Iterator<Item = &AllocationResult> {
        self.results.iter().filter(|r| r.delta_minutes != 0)
    }

    pub fn warning(&self) -> Option<&str> {
        self.weights.warning.as_deref()
    }
}

/// Distributes `target_hours` across `entries`.
///
/// Input preconditions are checked before the scorer is called, so a bad
/// request never costs a scoring round trip. Scoring failures degrade to
/// heuristic weights and are reported via [`Distribution::warning`].
pub async fn distribute<S: ComplexityScorer>(
    entries: &[TimeEntry],
    target_hours: f64,
    mode: DistributionMode,
    scorer: &S,
    config: &AllocationConfig,
) -> Result<Distribution, DistributionError> {
    validate_request(entries, target_hours, config)?;

    let weights = resolve_weights(entries, mode, scorer).await;
    let results = allocate_with(entries, target_hours, &weights.weights, config)?;

    tracing::info!(
        entries = results.len(),
        target_hours,
        mode = %mode,
        source = ?weights.source,
        "distributed time"
    );

    Ok(Distribution { results, weights })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::{ComplexityScore, ScoreError, ScoreRequest, UnavailableScorer};
    use crate::weights::WeightSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores each entry by the number in its label, e.g. "task 7" -> 7.
    #[derive(Default)]
    struct LabelScorer {
        calls: AtomicUsize,
    }

    impl ComplexityScorer for LabelScorer {
        async fn score(&self, batch: &[ScoreRequest]) -> Result<Vec<ComplexityScore>, ScoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            batch
                .iter()
                .map(|req| {
                    let score = req
                        .label
                        .rsplit(' ')
                        .next()
                        .and_then(|n| n.parse::<f64>().ok())
                        .ok_or_else(|| ScoreError::Malformed(req.label.clone()))?;
                    Ok(ComplexityScore::new(req.id.clone(), score))
                })
                .collect()
        }
    }

    fn entry(id: &str, label: &str, comment: &str, minutes: u64) -> TimeEntry {
        TimeEntry {
            id: id.to_string(),
            group_key: "PROJ-42".to_string(),
            label: label.to_string(),
            comment_text: comment.to_string(),
            current_seconds: minutes * 60,
        }
    }

    #[tokio::test]
    async fn smart_distribution_follows_scores() {
        let entries = vec![
            entry("A", "task 7", "", 60),
            entry("B", "task 3", "", 60),
        ];
        let scorer = LabelScorer::default();
        let distribution = distribute(
            &entries,
            8.0,
            DistributionMode::Smart,
            &scorer,
            &AllocationConfig::default(),
        )
        .await
        .unwrap();

        let minutes: Vec<u64> = distribution.results.iter().map(|r| r.new_minutes).collect();
        assert_eq!(minutes, vec![336, 144]);
        assert_eq!(distribution.total_minutes(), 480);
        assert_eq!(distribution.weights.source, WeightSource::Scored);
        assert_eq!(distribution.warning(), None);
    }

    #[tokio::test]
    async fn unavailable_scorer_degrades_with_warning() {
        let entries = vec![
            entry("A", "a", "short", 60),
            entry("B", "b", &"long comment ".repeat(20), 60),
        ];
        let scorer = UnavailableScorer::new("no API key configured");
        let distribution = distribute(
            &entries,
            3.0,
            DistributionMode::Smart,
            &scorer,
            &AllocationConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(distribution.total_minutes(), 180);
        assert_eq!(distribution.weights.source, WeightSource::Fallback);
        let warning = distribution.warning().unwrap();
        assert!(warning.contains("no API key configured"));
        // 5 chars -> 1, 259 chars -> 6
        assert_eq!(distribution.weights.values(), vec![1, 6]);
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_scorer() {
        let entries = vec![entry("A", "task 5", "", 60)];
        let scorer = LabelScorer::default();

        let err = distribute(
            &entries,
            30.0,
            DistributionMode::Smart,
            &scorer,
            &AllocationConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DistributionError::TargetOutOfRange { .. }));
        assert!(!err.is_internal());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn changed_skips_untouched_entries() {
        let entries = vec![
            entry("A", "task 1", "", 240),
            entry("B", "task 1", "", 200),
        ];
        let distribution = distribute(
            &entries,
            8.0,
            DistributionMode::Equal,
            &LabelScorer::default(),
            &AllocationConfig::default(),
        )
        .await
        .unwrap();

        let changed: Vec<&str> = distribution.changed().map(|r| r.entry_id.as_str()).collect();
        assert_eq!(changed, vec!["B"]);
        assert_eq!(distribution.results[1].delta_minutes, 40);
    }
}
