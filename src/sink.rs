//! Event sinks.
//!
//! The pipeline hands every [`Event`] to an [`EventSink`] and moves on. A
//! sink may log, count, forward, or serialize, but it never reports back:
//! sink trouble is the sink's problem and must not stall a worker.

use std::io::Write;
use std::sync::Arc;

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Histogram};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::event::{Event, EventKind};
use crate::telemetry::metrics;

/// Receiver of pipeline events. Called concurrently from every worker.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: Event) {
        (**self).emit(event)
    }
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Logs each event through `tracing` and records OTel metrics for it.
///
/// Failed items log at error level.
pub struct TracingSink {
    generated: Counter<u64>,
    bursts: Counter<u64>,
    processed: Counter<u64>,
    failed: Counter<u64>,
    duration: Histogram<f64>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self {
            generated: metrics::items_generated(),
            bursts: metrics::bursts(),
            processed: metrics::items_processed(),
            failed: metrics::items_failed(),
            duration: metrics::classification_duration(),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event.kind {
            EventKind::Generated { count } => {
                self.bursts.add(1, &[]);
                self.generated.add(count, &[]);
                info!(key = "generated", count, "Generated {count}");
            }
            EventKind::Processed {
                number,
                is_prime,
                duration_in_seconds,
            } => {
                self.processed.add(1, &[KeyValue::new("prime", is_prime)]);
                self.duration.record(duration_in_seconds, &[]);
                info!(
                    key = "processed",
                    number,
                    is_prime,
                    duration_in_seconds,
                    "Processed, {number} in {duration_in_seconds}s {is_prime}"
                );
            }
            EventKind::Failed { number, reason } => {
                self.failed.add(1, &[KeyValue::new("reason", reason.as_str())]);
                error!(key = "failed", number, reason = %reason, "Failed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Forwards events over an unbounded channel.
///
/// Sending never blocks; once the receiver is dropped events are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

// ---------------------------------------------------------------------------
// JSON lines
// ---------------------------------------------------------------------------

/// Writes one JSON object per event, newline-delimited.
///
/// Write failures are logged and the event is dropped from this sink only.
pub struct JsonLinesSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: Event) {
        let mut writer = self.writer.lock();
        let result = serde_json::to_writer(&mut *writer, &event)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write event");
        }
    }
}

// ---------------------------------------------------------------------------
// Fanout
// ---------------------------------------------------------------------------

/// Broadcasts each event to every inner sink, in order.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: Event) {
        let Some((last, rest)) = self.sinks.split_last() else {
            return;
        };
        for sink in rest {
            sink.emit(event.clone());
        }
        last.emit(event);
    }
}
