//! Injectable randomness.
//!
//! The generator and the latency model never touch a global RNG. They take a
//! [`RandSource`], so tests can script values and the CLI can run from a
//! fixed seed.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, rng};

pub trait RandSource: Send + Sync {
    /// Returns a value drawn uniformly from `[0, upper)`, or `0` when
    /// `upper` is `0`.
    fn below(&self, upper: u64) -> u64;

    /// Returns a value drawn uniformly from `[low, high)`, or `low` when the
    /// range is empty.
    fn between(&self, low: u64, high: u64) -> u64 {
        low + self.below(high.saturating_sub(low))
    }
}

impl<R: RandSource + ?Sized> RandSource for Arc<R> {
    fn below(&self, upper: u64) -> u64 {
        (**self).below(upper)
    }
}

/// A `RandSource` backed by the thread-local RNG.
///
/// Zero-sized: the RNG is looked up on every call, so the type is freely
/// shareable across worker threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        rng().random_range(0..upper)
    }
}

/// A deterministic `RandSource` seeded once at construction.
///
/// Draws are serialized through a mutex, so the sequence is reproducible
/// only when a single task consumes it.
#[derive(Debug)]
pub struct SeededRandom {
    inner: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandSource for SeededRandom {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 {
            return 0;
        }
        self.inner.lock().random_range(0..upper)
    }
}
