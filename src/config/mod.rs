//! Typed configuration.
//!
//! Layered once at startup: defaults, then an optional TOML file, then
//! environment variables. CLI flags are applied on top by the binary.
//! Invalid values fail fast.

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::ItemRange;

/// Tunables of the pipeline itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of worker slots (K).
    pub workers: usize,
    /// Queue capacity. `None` is unbounded.
    pub queue_capacity: Option<NonZeroUsize>,
    /// Pause between generation cycles.
    pub burst_interval: Duration,
    /// Exclusive upper bound of a burst's size.
    pub burst_max: u64,
    /// Range generated item values are drawn from.
    pub item_range: ItemRange,
    /// Exclusive upper bound of the simulated classification delay.
    pub latency_max: Duration,
    /// How long shutdown waits for the pool to drain before aborting it.
    pub drain_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: None,
            burst_interval: Duration::from_secs(5),
            burst_max: 50,
            item_range: ItemRange::default(),
            latency_max: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be at least 1".to_string()));
        }
        if self.burst_max == 0 {
            return Err(Error::Config("burst_max must be at least 1".to_string()));
        }
        if self.item_range.is_empty() {
            return Err(Error::Config(format!(
                "item range [{}, {}) is empty",
                self.item_range.start, self.item_range.end
            )));
        }
        if self.item_range.start == 0 {
            return Err(Error::Config("item_min must be positive".to_string()));
        }
        if self.burst_interval.is_zero() {
            return Err(Error::Config("burst_interval must be positive".to_string()));
        }
        if self.drain_timeout.is_zero() {
            return Err(Error::Config("drain_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

/// On-disk shape of a config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    workers: Option<usize>,
    queue_capacity: Option<usize>,
    burst_interval_secs: Option<f64>,
    burst_max: Option<u64>,
    item_min: Option<u64>,
    item_max: Option<u64>,
    latency_max_secs: Option<f64>,
    drain_timeout_secs: Option<f64>,
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}

impl Config {
    /// Load configuration from environment variables over the defaults.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::load(None, |name| std::env::var(name).ok())
    }

    /// Layer an optional TOML file and then variables from `lookup` over
    /// the defaults, and validate the result.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn load(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.apply_file(path)?;
        }
        config.apply_env(lookup)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text)?;
        let p = &mut self.pipeline;

        if let Some(workers) = file.workers {
            p.workers = workers;
        }
        if let Some(capacity) = file.queue_capacity {
            p.queue_capacity = Some(non_zero("queue_capacity", capacity)?);
        }
        if let Some(secs) = file.burst_interval_secs {
            p.burst_interval = secs_to_duration("burst_interval_secs", secs)?;
        }
        if let Some(max) = file.burst_max {
            p.burst_max = max;
        }
        if let Some(min) = file.item_min {
            p.item_range.start = min;
        }
        if let Some(max) = file.item_max {
            p.item_range.end = max;
        }
        if let Some(secs) = file.latency_max_secs {
            p.latency_max = secs_to_duration("latency_max_secs", secs)?;
        }
        if let Some(secs) = file.drain_timeout_secs {
            p.drain_timeout = secs_to_duration("drain_timeout_secs", secs)?;
        }
        if file.otel_endpoint.is_some() {
            self.otel_endpoint = file.otel_endpoint;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let p = &mut self.pipeline;

        if let Some(workers) = parsed(&lookup, "BURSTQ_WORKERS")? {
            p.workers = workers;
        }
        if let Some(capacity) = parsed(&lookup, "BURSTQ_QUEUE_CAPACITY")? {
            p.queue_capacity = Some(non_zero("BURSTQ_QUEUE_CAPACITY", capacity)?);
        }
        if let Some(secs) = parsed(&lookup, "BURSTQ_BURST_INTERVAL_SECS")? {
            p.burst_interval = secs_to_duration("BURSTQ_BURST_INTERVAL_SECS", secs)?;
        }
        if let Some(max) = parsed(&lookup, "BURSTQ_BURST_MAX")? {
            p.burst_max = max;
        }
        if let Some(min) = parsed(&lookup, "BURSTQ_ITEM_MIN")? {
            p.item_range.start = min;
        }
        if let Some(max) = parsed(&lookup, "BURSTQ_ITEM_MAX")? {
            p.item_range.end = max;
        }
        if let Some(secs) = parsed(&lookup, "BURSTQ_LATENCY_MAX_SECS")? {
            p.latency_max = secs_to_duration("BURSTQ_LATENCY_MAX_SECS", secs)?;
        }
        if let Some(secs) = parsed(&lookup, "BURSTQ_DRAIN_TIMEOUT_SECS")? {
            p.drain_timeout = secs_to_duration("BURSTQ_DRAIN_TIMEOUT_SECS", secs)?;
        }
        if let Some(endpoint) = lookup("OTEL_ENDPOINT") {
            self.otel_endpoint = Some(endpoint);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("{name}={raw:?}: {e}")))
        })
        .transpose()
}

fn non_zero(name: &str, value: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value).ok_or_else(|| Error::Config(format!("{name} must be at least 1")))
}

fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("{name}={secs}: {e}")))
}
