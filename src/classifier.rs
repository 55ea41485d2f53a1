//! Work classification: the divisibility gate, simulated latency, and the
//! trial-division primality check.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::model::{FailureReason, Outcome, WorkItem};
use crate::random::RandSource;

/// Trial division over `[2, n/2 + 1]`, inclusive.
///
/// `n` is prime iff nothing in that range divides it. The range is kept as
/// is for small `n` too: `1` and `3` are reported prime, `2` is not.
pub fn is_prime(n: u64) -> bool {
    let upper = n / 2 + 1;
    !(2..=upper).any(|div| n % div == 0)
}

/// Decides the outcome of one work item.
///
/// Implementations run inside a worker slot; the slot stays busy until the
/// returned future resolves.
pub trait Classifier: Send + Sync + 'static {
    fn classify(&self, item: WorkItem) -> impl Future<Output = Outcome> + Send;
}

// ---------------------------------------------------------------------------
// Latency
// ---------------------------------------------------------------------------

/// Source of the simulated delay applied before the primality check.
pub trait LatencyModel: Send + Sync + 'static {
    fn next_delay(&self) -> Duration;
}

/// Delay drawn uniformly from `[0, upper)` at millisecond granularity.
#[derive(Debug, Clone)]
pub struct UniformLatency<R> {
    upper: Duration,
    rand: R,
}

impl<R: RandSource> UniformLatency<R> {
    pub fn new(upper: Duration, rand: R) -> Self {
        Self { upper, rand }
    }
}

impl<R: RandSource + 'static> LatencyModel for UniformLatency<R> {
    fn next_delay(&self) -> Duration {
        let upper_ms = u64::try_from(self.upper.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rand.below(upper_ms))
    }
}

/// Always the same delay. `FixedLatency::none()` disables latency entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLatency(pub Duration);

impl FixedLatency {
    pub const fn none() -> Self {
        Self(Duration::ZERO)
    }
}

impl LatencyModel for FixedLatency {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Prime classifier
// ---------------------------------------------------------------------------

/// The production classifier.
#[derive(Debug, Clone)]
pub struct PrimeClassifier<L> {
    latency: L,
}

impl<L: LatencyModel> PrimeClassifier<L> {
    pub fn new(latency: L) -> Self {
        Self { latency }
    }
}

impl<L: LatencyModel> Classifier for PrimeClassifier<L> {
    fn classify(&self, item: WorkItem) -> impl Future<Output = Outcome> + Send {
        let n = item.number();
        // Rejection must not pay for the delay, so draw it only on the slow path.
        let delay = (n % 10 != 0).then(|| self.latency.next_delay());

        async move {
            let Some(delay) = delay else {
                return Outcome::Failed(FailureReason::DivisibleByTen);
            };

            let start = Instant::now();
            tokio::time::sleep(delay).await;
            // Trial division is O(n); keep it off the async worker threads.
            let is_prime = match tokio::task::spawn_blocking(move || is_prime(n)).await {
                Ok(is_prime) => is_prime,
                Err(e) => std::panic::resume_unwind(e.into_panic()),
            };

            Outcome::Processed {
                is_prime,
                duration_secs: start.elapsed().as_secs_f64(),
            }
        }
    }
}
