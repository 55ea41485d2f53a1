//! Core data model.
//!
//! A work item is a number that needs classifying. Classifying it yields an
//! [`Outcome`]: either the item was rejected up front, or it was processed
//! and found prime or composite.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A unit of work flowing from the generator to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItem(pub u64);

impl WorkItem {
    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn number(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open range `[start, end)` that generated item values are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRange {
    pub start: u64,
    pub end: u64,
}

impl ItemRange {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Default for ItemRange {
    fn default() -> Self {
        Self::new(1_000, 1_000_000)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why an item was rejected without being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    DivisibleByTen,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DivisibleByTen => "divisible by ten",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one work item. Turned into an event right away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Failed(FailureReason),
    Processed { is_prime: bool, duration_secs: f64 },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Short label used for span fields and metric attributes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Failed(_) => "failed",
            Self::Processed { is_prime: true, .. } => "prime",
            Self::Processed { is_prime: false, .. } => "composite",
        }
    }
}
