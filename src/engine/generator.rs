//! Burst generator: every interval, enqueue a randomly sized batch of
//! random items.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::model::{ItemRange, WorkItem};
use crate::queue::WorkSender;
use crate::random::RandSource;
use crate::sink::EventSink;
use crate::telemetry::work::{record_burst_count, start_burst_span};

/// Generator settings, a subset of [`PipelineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstConfig {
    pub interval: Duration,
    /// Burst sizes are drawn from `[0, burst_max)`.
    pub burst_max: u64,
    pub item_range: ItemRange,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for BurstConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            interval: config.burst_interval,
            burst_max: config.burst_max,
            item_range: config.item_range,
        }
    }
}

/// What one generation cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    /// Zero-based cycle number.
    pub cycle: u64,
    /// Items drawn for this cycle.
    pub planned: u64,
    /// Items actually enqueued. Less than `planned` only when the cycle was
    /// cancelled part way.
    pub count: u64,
}

impl Burst {
    pub fn is_complete(&self) -> bool {
        self.count == self.planned
    }
}

pub struct BurstGenerator<R> {
    config: BurstConfig,
    rand: R,
    sender: WorkSender,
    sink: Arc<dyn EventSink>,
    cycle: u64,
}

impl<R: RandSource> BurstGenerator<R> {
    pub fn new(config: BurstConfig, rand: R, sender: WorkSender, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            rand,
            sender,
            sink,
            cycle: 0,
        }
    }

    /// Cycles started so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Run one generation cycle, without the trailing interval.
    ///
    /// Emits exactly one Generated event carrying the number of items that
    /// made it into the queue, even if the cycle is cut short.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the queue closed mid-burst.
    pub async fn burst(&mut self, shutdown: &CancellationToken) -> Result<Burst> {
        let cycle = self.cycle;
        self.cycle += 1;

        let span = start_burst_span(cycle);
        let planned = self.rand.below(self.config.burst_max);
        let (count, closed) = self
            .enqueue(planned, shutdown)
            .instrument(span.clone())
            .await;

        record_burst_count(&span, count);
        span.in_scope(|| self.sink.emit(Event::generated(count)));

        if closed {
            warn!(cycle, count, planned, "work queue closed mid-burst");
            return Err(Error::QueueClosed);
        }
        Ok(Burst {
            cycle,
            planned,
            count,
        })
    }

    /// Returns the number of items enqueued and whether the queue was found
    /// closed.
    async fn enqueue(&self, planned: u64, shutdown: &CancellationToken) -> (u64, bool) {
        let ItemRange { start, end } = self.config.item_range;
        let mut count = 0;

        for _ in 0..planned {
            let item = WorkItem::new(self.rand.between(start, end));
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(count, planned, "burst cancelled");
                    break;
                }
                sent = self.sender.send(item) => match sent {
                    Ok(()) => count += 1,
                    Err(_) => return (count, true),
                },
            }
        }

        (count, false)
    }

    /// Generate bursts until `shutdown` is cancelled or the queue closes.
    ///
    /// Dropping the generator at the end drops its sender, which lets the
    /// pool drain and exit.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            burst_max = self.config.burst_max,
            "generator started"
        );

        loop {
            if self.sender.is_closed() {
                warn!(cycles = self.cycle, "work queue closed, generator stopping");
                return;
            }

            match self.burst(&shutdown).await {
                Ok(burst) => debug!(cycle = burst.cycle, count = burst.count, "burst enqueued"),
                Err(_) => return,
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(cycles = self.cycle, "generator stopped");
                    return;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }
}
