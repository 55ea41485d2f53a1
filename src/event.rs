//! Structured events emitted by the pipeline.
//!
//! The generator reports each burst and the pool reports each item's
//! terminal outcome. Events are the pipeline's only voice; sinks decide
//! whether they become log lines, metrics, or JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FailureReason, Outcome, WorkItem};

/// A structured event emitted by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// When this event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventKind {
    Generated {
        count: u64,
    },
    Processed {
        number: u64,
        is_prime: bool,
        duration_in_seconds: f64,
    },
    Failed {
        number: u64,
        reason: FailureReason,
    },
}

impl Event {
    pub fn now(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn generated(count: u64) -> Self {
        Self::now(EventKind::Generated { count })
    }

    /// The terminal event for one classified item.
    pub fn outcome(item: WorkItem, outcome: Outcome) -> Self {
        let number = item.number();
        Self::now(match outcome {
            Outcome::Failed(reason) => EventKind::Failed { number, reason },
            Outcome::Processed {
                is_prime,
                duration_secs,
            } => EventKind::Processed {
                number,
                is_prime,
                duration_in_seconds: duration_secs,
            },
        })
    }

    /// Failed events are error-level; everything else is informational.
    pub fn is_error(&self) -> bool {
        matches!(self.kind, EventKind::Failed { .. })
    }

    /// True for the per-item events (Processed or Failed).
    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, EventKind::Generated { .. })
    }
}
