//! Pipeline engine: burst generation, the worker pool, and their wiring.

pub mod generator;
pub mod pipeline;
pub mod pool;

pub use generator::{Burst, BurstConfig, BurstGenerator};
pub use pipeline::{Pipeline, RunReport};
pub use pool::WorkerPool;
