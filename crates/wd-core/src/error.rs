//! Errors returned by the distribution engine.

use thiserror::Error;

/// Why a distribution call was rejected.
///
/// Every variant except [`DistributionError::InvariantViolation`] is a
/// precondition failure: nothing was computed and the caller should fix the
/// input and retry the whole call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DistributionError {
    /// No entries were supplied.
    #[error("no entries to distribute")]
    EmptyEntries,

    /// Target hours were not in `(0, 24]`.
    #[error("target must be greater than 0 and at most 24 hours, got {target_hours}")]
    TargetOutOfRange { target_hours: f64 },

    /// The number of weights does not match the number of entries.
    #[error("expected {entries} weights, got {weights}")]
    WeightCountMismatch { entries: usize, weights: usize },

    /// A weight is bound to a different entry than the one at its position.
    #[error("weight at index {index} belongs to entry {found}, expected {expected}")]
    WeightEntryMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// More entries than the batch ceiling allows.
    #[error("too many entries: {count} exceeds the limit of {max}")]
    TooManyEntries { count: usize, max: usize },

    /// All weights summed to zero.
    #[error("total weight is zero")]
    ZeroTotalWeight,

    /// The allocated minutes did not add up to the target.
    #[error("internal error: allocated {actual} minutes, expected exactly {expected}")]
    InvariantViolation { expected: u64, actual: u64 },
}

impl DistributionError {
    /// Returns `true` for allocator bugs rather than bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
