//! Worker pool: K slots pulling items off the shared queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::task::JoinSet;
use tracing::{Instrument, debug, info};

use crate::classifier::Classifier;
use crate::error::Result;
use crate::event::Event;
use crate::queue::WorkReceiver;
use crate::sink::EventSink;
use crate::telemetry::work::{record_outcome, start_item_span};

/// A fixed set of workers. Each worker handles one item at a time, so at
/// most `size` items are ever being classified.
pub struct WorkerPool {
    workers: JoinSet<()>,
    size: usize,
    in_flight: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `size` workers on the current tokio runtime.
    ///
    /// Workers run until the queue is closed and drained.
    pub fn spawn<C: Classifier>(
        size: usize,
        receiver: WorkReceiver,
        classifier: Arc<C>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();
        for slot in 0..size {
            workers.spawn(run_worker(
                slot,
                receiver.clone(),
                Arc::clone(&classifier),
                Arc::clone(&sink),
                Arc::clone(&in_flight),
            ));
        }
        info!(workers = size, "worker pool started");
        Self {
            workers,
            size,
            in_flight,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers that have not exited yet.
    pub fn live(&self) -> usize {
        self.workers.len()
    }

    /// Items taken off the queue whose event has not been emitted yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait for every worker to exit.
    ///
    /// Only resolves once the queue has been closed and drained. Safe to
    /// cancel and call again.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Worker`] if a worker panicked.
    pub async fn drain(&mut self) -> Result<()> {
        while let Some(joined) = self.workers.join_next().await {
            joined?;
        }
        Ok(())
    }

    /// Abort every remaining worker and wait until they are gone.
    ///
    /// Returns how many items were interrupted mid-classification. Those
    /// items produce no event.
    pub async fn abort(&mut self) -> usize {
        self.workers.shutdown().await;
        self.in_flight.swap(0, Ordering::SeqCst)
    }
}

async fn run_worker<C: Classifier>(
    slot: usize,
    receiver: WorkReceiver,
    classifier: Arc<C>,
    sink: Arc<dyn EventSink>,
    in_flight: Arc<AtomicUsize>,
) {
    debug!(slot, "worker started");

    while let Some(item) = receiver.recv().await {
        in_flight.fetch_add(1, Ordering::SeqCst);
        let span = start_item_span(slot, item.number());
        let outcome = classifier.classify(item).instrument(span.clone()).await;
        record_outcome(&span, &outcome);
        span.in_scope(|| sink.emit(Event::outcome(item, outcome)));
        in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    debug!(slot, "queue drained, worker exiting");
}
