//! Metric instrument factories for burstq.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without a provider installed these are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for burstq instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("burstq")
}

/// Counter: work items enqueued by the generator.
pub fn items_generated() -> Counter<u64> {
    meter()
        .u64_counter("burstq.items.generated")
        .with_description("Number of work items enqueued by the generator")
        .build()
}

/// Counter: completed generation cycles.
pub fn bursts() -> Counter<u64> {
    meter()
        .u64_counter("burstq.bursts")
        .with_description("Number of generation cycles")
        .build()
}

/// Counter: items that passed the divisibility gate and were classified.
/// Labels: `prime` (true | false).
pub fn items_processed() -> Counter<u64> {
    meter()
        .u64_counter("burstq.items.processed")
        .with_description("Number of work items classified")
        .build()
}

/// Counter: items rejected before classification.
/// Labels: `reason`.
pub fn items_failed() -> Counter<u64> {
    meter()
        .u64_counter("burstq.items.failed")
        .with_description("Number of work items rejected")
        .build()
}

/// Histogram: classification duration in seconds, simulated delay included.
pub fn classification_duration() -> Histogram<f64> {
    meter()
        .f64_histogram("burstq.classification.duration")
        .with_description("Time a worker slot spent classifying one item")
        .with_unit("s")
        .build()
}
