//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest weight an entry can carry.
pub const MIN_WEIGHT: u8 = 1;

/// Largest weight an entry can carry.
pub const MAX_WEIGHT: u8 = 10;

/// Weight assigned when the scorer returned nothing usable for an entry.
pub const NEUTRAL_WEIGHT: u8 = 5;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The weight value was outside `[MIN_WEIGHT, MAX_WEIGHT]`.
    #[error("weight must be between 1 and 10, got {value}")]
    WeightOutOfRange { value: u8 },

    /// Invalid distribution mode value.
    #[error("invalid distribution mode: {value} (expected 'equal' or 'smart')")]
    InvalidMode { value: String },

    /// Invalid remainder policy value.
    #[error("invalid remainder policy: {value} (expected 'weight' or 'fraction')")]
    InvalidPolicy { value: String },
}

/// How weights are produced for a distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Every entry gets the same weight.
    #[default]
    Equal,
    /// Weights come from a complexity scorer, with a local fallback.
    Smart,
}

impl DistributionMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Smart => "smart",
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DistributionMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equal" => Ok(Self::Equal),
            "smart" => Ok(Self::Smart),
            _ => Err(ValidationError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Order in which leftover minutes are handed out after flooring.
///
/// The leftover is always smaller than the entry count, so each entry
/// receives at most one extra minute under either policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Highest weight first, ties broken by input order.
    #[default]
    #[serde(alias = "weight-descending")]
    Weight,
    /// Largest discarded fraction first, then highest weight, then input order.
    #[serde(alias = "largest-fraction")]
    Fraction,
}

impl RemainderPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Fraction => "fraction",
        }
    }
}

impl fmt::Display for RemainderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RemainderPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weight" | "weight-descending" => Ok(Self::Weight),
            "fraction" | "largest-fraction" => Ok(Self::Fraction),
            _ => Err(ValidationError::InvalidPolicy {
                value: s.to_string(),
            }),
        }
    }
}

/// An existing worklog entry whose duration is about to be reallocated.
///
/// Read-only to the distribution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    /// Unique identifier of the worklog.
    pub id: String,

    /// Parent work item (issue key). Only used to label results.
    #[serde(default, alias = "groupKey")]
    pub group_key: String,

    /// Short human-readable description.
    #[serde(default)]
    pub label: String,

    /// Free-text comment; scoring input only.
    #[serde(default, alias = "commentText")]
    pub comment_text: String,

    /// Currently stored duration in seconds.
    #[serde(default, alias = "currentSeconds")]
    pub current_seconds: u64,
}

impl TimeEntry {
    /// Current duration rounded to the nearest minute (half up).
    #[must_use]
    pub const fn current_minutes(&self) -> u64 {
        self.current_seconds.saturating_add(30) / 60
    }
}

/// A relative complexity weight in `[MIN_WEIGHT, MAX_WEIGHT]` bound to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Weight {
    entry_id: String,
    value: u8,
}

impl Weight {
    /// Creates a weight after range validation.
    pub fn new(entry_id: impl Into<String>, value: u8) -> Result<Self, ValidationError> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&value) {
            return Err(ValidationError::WeightOutOfRange { value });
        }
        Ok(Self {
            entry_id: entry_id.into(),
            value,
        })
    }

    /// Weight 1, used for equal splits.
    pub fn uniform(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            value: MIN_WEIGHT,
        }
    }

    /// Rounds an untrusted score to the nearest integer and clamps it into range.
    ///
    /// Non-finite scores map to `NEUTRAL_WEIGHT`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamped(entry_id: impl Into<String>, score: f64) -> Self {
        let value = if score.is_finite() {
            score
                .round()
                .clamp(f64::from(MIN_WEIGHT), f64::from(MAX_WEIGHT)) as u8
        } else {
            NEUTRAL_WEIGHT
        };
        Self {
            entry_id: entry_id.into(),
            value,
        }
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub const fn value(&self) -> u8 {
        self.value
    }
}

/// New duration computed for one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationResult {
    pub entry_id: String,
    pub group_key: String,
    pub label: String,

    /// Allocated whole minutes.
    pub new_minutes: u64,

    /// `new_minutes * 60`; the value callers persist.
    pub new_seconds: u64,

    /// `new_minutes / 60` rounded to two decimals. Display only.
    pub new_hours: f64,

    /// Change against the entry's previous duration, in minutes.
    pub delta_minutes: i64,
}

impl AllocationResult {
    pub(crate) fn new(entry: &TimeEntry, new_minutes: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let new_hours = (new_minutes as f64 / 60.0 * 100.0).round() / 100.0;
        #[allow(clippy::cast_possible_wrap)]
        let delta_minutes = new_minutes as i64 - entry.current_minutes() as i64;
        Self {
            entry_id: entry.id.clone(),
            group_key: entry.group_key.clone(),
            label: entry.label.clone(),
            new_minutes,
            new_seconds: new_minutes * 60,
            new_hours,
            delta_minutes,
        }
    }
}
