//! Span helpers for items and bursts flowing through the pipeline.

use tracing::Span;

use crate::model::Outcome;

/// Start a span for one item's classification in a worker slot.
///
/// The `item.outcome` field is declared empty and filled by
/// [`record_outcome`].
pub fn start_item_span(slot: usize, number: u64) -> Span {
    tracing::info_span!(
        "item.classify",
        "worker.slot" = slot,
        "item.number" = number,
        "item.outcome" = tracing::field::Empty,
    )
}

/// Record the item's outcome on its span.
pub fn record_outcome(span: &Span, outcome: &Outcome) {
    span.record("item.outcome", outcome.label());
}

/// Start a span for one generation cycle.
///
/// `burst.count` is filled once the burst has been enqueued.
pub fn start_burst_span(cycle: u64) -> Span {
    tracing::info_span!(
        "burst.generate",
        "burst.cycle" = cycle,
        "burst.count" = tracing::field::Empty,
    )
}

/// Record how many items a burst actually enqueued.
pub fn record_burst_count(span: &Span, count: u64) {
    span.record("burst.count", count);
}
