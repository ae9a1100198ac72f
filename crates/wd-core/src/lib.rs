//! Core domain logic for worklog time distribution.
//!
//! This crate contains the fundamental types and logic for:
//! - Weight resolution: uniform or complexity-scored weights per entry
//! - Allocation: splitting a target duration into whole minutes that sum exactly
//! - Distribution: the validated pipeline combining both
//!
//! Nothing here performs I/O. Complexity scoring is injected through
//! [`ComplexityScorer`].

mod allocation;
mod distribution;
mod error;
pub mod scorer;
pub mod types;
mod weights;

pub use allocation::{
    AllocationConfig, DEFAULT_MAX_ENTRIES, MAX_TARGET_HOURS, allocate, allocate_with, check_batch,
    target_minutes, validate_request,
};
pub use distribution::{Distribution, distribute};
pub use error::DistributionError;
pub use scorer::{ComplexityScore, ComplexityScorer, ScoreError, ScoreRequest, UnavailableScorer};
pub use types::{
    AllocationResult, DistributionMode, RemainderPolicy, TimeEntry, ValidationError, Weight,
};
pub use weights::{
    FALLBACK_CHARS_PER_POINT, ResolvedWeights, WeightSource, heuristic_weight, resolve_weights,
};
