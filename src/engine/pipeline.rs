//! Wires the generator, queue, pool and sink together and owns shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::classifier::{Classifier, PrimeClassifier, UniformLatency};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::queue::work_queue;
use crate::random::RandSource;
use crate::sink::EventSink;

use super::generator::{BurstConfig, BurstGenerator};
use super::pool::WorkerPool;

/// How a run ended.
///
/// A clean shutdown drains every queued item. When the drain deadline
/// expires instead, the items that never produced an event are counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Workers still live when the drain deadline expired.
    pub aborted_workers: usize,
    /// Items a worker had taken but not finished.
    pub interrupted: usize,
    /// Items still waiting in the queue.
    pub discarded: usize,
}

impl RunReport {
    /// Items that produced no terminal event.
    pub fn lost(&self) -> usize {
        self.interrupted + self.discarded
    }

    pub fn is_clean(&self) -> bool {
        self.aborted_workers == 0 && self.lost() == 0
    }
}

/// A configured pipeline, ready to run.
pub struct Pipeline<C, R> {
    config: PipelineConfig,
    classifier: Arc<C>,
    rand: R,
    sink: Arc<dyn EventSink>,
}

impl<R> Pipeline<PrimeClassifier<UniformLatency<R>>, R>
where
    R: RandSource + Clone + 'static,
{
    /// The standard pipeline: prime classification with uniform latency up
    /// to `config.latency_max`, sharing `rand` with the generator.
    pub fn standard(
        config: PipelineConfig,
        rand: R,
        sink: impl EventSink + 'static,
    ) -> Result<Self> {
        let latency = UniformLatency::new(config.latency_max, rand.clone());
        Self::new(config, PrimeClassifier::new(latency), rand, sink)
    }
}

impl<C, R> Pipeline<C, R>
where
    C: Classifier,
    R: RandSource + 'static,
{
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Config`] if `config` is invalid.
    pub fn new(
        config: PipelineConfig,
        classifier: C,
        rand: R,
        sink: impl EventSink + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            classifier: Arc::new(classifier),
            rand,
            sink: Arc::new(sink),
        })
    }

    /// Run until `shutdown` is cancelled, then drain.
    ///
    /// Cancellation stops the generator; whatever is already queued is still
    /// classified. If draining outlasts `drain_timeout`, the remaining
    /// workers are aborted and the returned report counts the items that
    /// never produced an event.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Worker`] if the generator or a worker
    /// panicked.
    pub async fn run(self, shutdown: CancellationToken) -> Result<RunReport> {
        let Self {
            config,
            classifier,
            rand,
            sink,
        } = self;

        let (sender, receiver) = work_queue(config.queue_capacity);
        let mut pool = WorkerPool::spawn(
            config.workers,
            receiver.clone(),
            classifier,
            Arc::clone(&sink),
        );

        let generator = BurstGenerator::new(BurstConfig::from(&config), rand, sender, sink);
        tokio::spawn(generator.run(shutdown)).await?;

        info!(
            drain_timeout_secs = config.drain_timeout.as_secs_f64(),
            "generator finished, draining work queue"
        );
        let mut report = RunReport::default();
        match tokio::time::timeout(config.drain_timeout, pool.drain()).await {
            Ok(drained) => drained?,
            Err(_) => {
                report.aborted_workers = pool.live();
                report.interrupted = pool.abort().await;
                while receiver.try_recv().is_some() {
                    report.discarded += 1;
                }
                warn!(
                    aborted = report.aborted_workers,
                    interrupted = report.interrupted,
                    discarded = report.discarded,
                    "drain timed out, {} items produced no event",
                    report.lost()
                );
            }
        }

        info!("pipeline stopped");
        Ok(report)
    }
}
