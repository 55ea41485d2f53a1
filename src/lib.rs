//! # burstq
//!
//! A bounded-concurrency work pipeline. A generator enqueues random numbers
//! in bursts; a fixed pool of workers classifies them (rejecting multiples
//! of ten, checking the rest for primality after a simulated delay) and
//! reports every outcome as a structured event.
//!
//! Events go to an [`sink::EventSink`]; the stock [`sink::TracingSink`]
//! logs them and records OpenTelemetry metrics.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod model;
pub mod queue;
pub mod random;
pub mod sink;
pub mod telemetry;
