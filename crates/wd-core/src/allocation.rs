//! Proportional time allocation.
//!
//! Splits a target duration across entries in proportion to their weights
//! so that the allocated minutes add up to the target exactly.
//!
//! # Algorithm Summary
//!
//! 1. Convert the target hours to whole minutes (`round(hours * 60)`); all
//!    further arithmetic is integer-only
//! 2. Give each entry `floor(weight * target / total_weight)` minutes
//! 3. Hand out the leftover minutes one at a time in [`RemainderPolicy`] order
//! 4. Check that the sum equals the target and fail loudly if it does not

use crate::error::DistributionError;
use crate::types::{AllocationResult, RemainderPolicy, TimeEntry, Weight};

/// Default ceiling on entries per call.
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Largest target accepted, in hours.
pub const MAX_TARGET_HOURS: f64 = 24.0;

/// Configuration for time allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationConfig {
    /// Maximum number of entries in one call.
    /// Default: 50.
    pub max_entries: usize,

    /// Who receives the minutes lost to flooring.
    /// Default: highest weight first.
    pub remainder_policy: RemainderPolicy,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            remainder_policy: RemainderPolicy::default(),
        }
    }
}

/// Converts target hours to whole minutes after range validation.
///
/// Rounds to the nearest minute, so 8.05 hours is 483 minutes.
pub fn target_minutes(target_hours: f64) -> Result<u64, DistributionError> {
    if target_hours.is_nan() || target_hours <= 0.0 || target_hours > MAX_TARGET_HOURS {
        return Err(DistributionError::TargetOutOfRange { target_hours });
    }
    // In (0, 1440] after the range check.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (target_hours * 60.0).round() as u64;
    Ok(minutes)
}

/// Checks the entry-level preconditions and returns the target in minutes.
///
/// Weight checks happen separately in [`allocate_with`], since weights are
/// usually resolved after this validation passes.
pub fn validate_request(
    entries: &[TimeEntry],
    target_hours: f64,
    config: &AllocationConfig,
) -> Result<u64, DistributionError> {
    check_batch(entries, config)?;
    target_minutes(target_hours)
}

/// Checks that a batch is non-empty and within the configured ceiling.
///
/// Run this before anything that sends the batch to a scorer.
pub fn check_batch(
    entries: &[TimeEntry],
    config: &AllocationConfig,
) -> Result<(), DistributionError> {
    if entries.is_empty() {
        return Err(DistributionError::EmptyEntries);
    }
    if entries.len() > config.max_entries {
        return Err(DistributionError::TooManyEntries {
            count: entries.len(),
            max: config.max_entries,
        });
    }
    Ok(())
}

/// Allocates `target_hours` across `entries` with the default configuration.
pub fn allocate(
    entries: &[TimeEntry],
    target_hours: f64,
    weights: &[Weight],
) -> Result<Vec<AllocationResult>, DistributionError> {
    allocate_with(entries, target_hours, weights, &AllocationConfig::default())
}

/// Allocates `target_hours` across `entries`.
///
/// `weights[i]` must be bound to `entries[i]`. Returns one result per entry,
/// in entry order, whose `new_minutes` sum to exactly
/// `round(target_hours * 60)`. An entry may be allocated zero minutes.
pub fn allocate_with(
    entries: &[TimeEntry],
    target_hours: f64,
    weights: &[Weight],
    config: &AllocationConfig,
) -> Result<Vec<AllocationResult>, DistributionError> {
    let target = validate_request(entries, target_hours, config)?;
    check_weights(entries, weights)?;

    let values: Vec<u64> = weights.iter().map(|w| u64::from(w.value())).collect();
    let minutes = apportion(target, &values, config.remainder_policy)?;

    tracing::debug!(
        target_minutes = target,
        entries = entries.len(),
        policy = %config.remainder_policy,
        allocation = ?minutes,
        "allocated minutes"
    );

    Ok(entries
        .iter()
        .zip(minutes)
        .map(|(entry, new_minutes)| AllocationResult::new(entry, new_minutes))
        .collect())
}

fn check_weights(entries: &[TimeEntry], weights: &[Weight]) -> Result<(), DistributionError> {
    if weights.len() != entries.len() {
        return Err(DistributionError::WeightCountMismatch {
            entries: entries.len(),
            weights: weights.len(),
        });
    }
    for (index, (entry, weight)) in entries.iter().zip(weights).enumerate() {
        if entry.id != weight.entry_id() {
            return Err(DistributionError::WeightEntryMismatch {
                index,
                expected: entry.id.clone(),
                found: weight.entry_id().to_string(),
            });
        }
    }
    Ok(())
}

/// Splits `target` into integer shares proportional to `weights`.
pub(crate) fn apportion(
    target: u64,
    weights: &[u64],
    policy: RemainderPolicy,
) -> Result<Vec<u64>, DistributionError> {
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Err(DistributionError::ZeroTotalWeight);
    }

    let mut shares: Vec<u64> = weights.iter().map(|&w| w * target / total).collect();
    let distributed: u64 = shares.iter().sum();
    let Some(remainder) = target.checked_sub(distributed) else {
        return Err(DistributionError::InvariantViolation {
            expected: target,
            actual: distributed,
        });
    };

    let order = remainder_order(target, weights, total, policy);
    let remainder = usize::try_from(remainder).unwrap_or(usize::MAX);
    for &index in order.iter().cycle().take(remainder) {
        shares[index] += 1;
    }

    let actual: u64 = shares.iter().sum();
    if actual != target {
        return Err(DistributionError::InvariantViolation {
            expected: target,
            actual,
        });
    }
    Ok(shares)
}

/// Entry indices in the order they receive leftover minutes.
///
/// Both orders rely on `sort_by` being stable so ties keep input order.
fn remainder_order(target: u64, weights: &[u64], total: u64, policy: RemainderPolicy) -> Vec<usize> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    match policy {
        RemainderPolicy::Weight => {
            order.sort_by(|&a, &b| weights[b].cmp(&weights[a]));
        }
        RemainderPolicy::Fraction => {
            let fraction = |i: usize| weights[i] * target % total;
            order.sort_by(|&a, &b| {
                fraction(b)
                    .cmp(&fraction(a))
                    .then_with(|| weights[b].cmp(&weights[a]))
            });
        }
    }
    order
}
