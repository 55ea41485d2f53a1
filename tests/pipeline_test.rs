//! End-to-end tests: generator, queue, pool and sink wired together.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use burstq::classifier::Classifier;
use burstq::config::PipelineConfig;
use burstq::engine::{Pipeline, RunReport};
use burstq::error::Error;
use burstq::event::{Event, EventKind};
use burstq::model::{Outcome, WorkItem};
use burstq::random::{RandSource, SeededRandom, ThreadRandom};
use burstq::sink::ChannelSink;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct Tally {
    bursts: usize,
    generated: u64,
    processed: u64,
    failed: u64,
}

fn tally(rx: &mut mpsc::UnboundedReceiver<Event>) -> Tally {
    let mut t = Tally {
        bursts: 0,
        generated: 0,
        processed: 0,
        failed: 0,
    };
    while let Ok(event) = rx.try_recv() {
        match event.kind {
            EventKind::Generated { count } => {
                t.bursts += 1;
                t.generated += count;
            }
            EventKind::Processed { .. } => t.processed += 1,
            EventKind::Failed { .. } => t.failed += 1,
        }
    }
    t
}

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        workers: 4,
        burst_interval: Duration::from_secs(5),
        latency_max: Duration::from_secs(1),
        drain_timeout: Duration::from_secs(600),
        ..PipelineConfig::default()
    }
}

/// Never finishes an item.
struct Stuck;

/// Always draws the same offset (modulo the requested bound).
struct Constant(u64);

impl RandSource for Constant {
    fn below(&self, upper: u64) -> u64 {
        if upper == 0 { 0 } else { self.0 % upper }
    }
}

impl Classifier for Stuck {
    fn classify(&self, _item: WorkItem) -> impl Future<Output = Outcome> + Send {
        std::future::pending()
    }
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_accounts_for_every_generated_item() {
    let (sink, mut events) = ChannelSink::new();
    let rand = Arc::new(SeededRandom::new(9));
    let pipeline = Pipeline::standard(fast_config(), rand, sink).unwrap();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(pipeline.run(shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(22)).await;
    shutdown.cancel();
    let report = handle.await.unwrap().unwrap();

    assert!(report.is_clean(), "{report:?}");
    let t = tally(&mut events);
    assert_eq!(t.bursts, 5);
    assert_eq!(t.processed + t.failed, t.generated);
}

#[tokio::test(start_paused = true)]
async fn expired_drain_deadline_accounts_for_unfinished_items() {
    let config = PipelineConfig {
        workers: 1,
        drain_timeout: Duration::from_secs(5),
        ..PipelineConfig::default()
    };
    let (sink, mut events) = ChannelSink::new();
    let pipeline = Pipeline::standard(config, Arc::new(SeededRandom::new(2)), sink).unwrap();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(pipeline.run(shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(31)).await;
    shutdown.cancel();
    let report = handle.await.unwrap().unwrap();

    let t = tally(&mut events);
    assert_eq!(
        t.processed + t.failed + report.lost() as u64,
        t.generated,
        "{report:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn bounded_queue_applies_backpressure_without_losing_items() {
    let config = PipelineConfig {
        workers: 1,
        queue_capacity: NonZeroUsize::new(1),
        ..fast_config()
    };
    let (sink, mut events) = ChannelSink::new();
    let pipeline = Pipeline::standard(config, ThreadRandom, sink).unwrap();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(pipeline.run(shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(60)).await;
    shutdown.cancel();
    handle.await.unwrap().unwrap();

    let t = tally(&mut events);
    assert!(t.bursts >= 1);
    assert_eq!(t.processed + t.failed, t.generated);
}

#[tokio::test(start_paused = true)]
async fn drain_timeout_aborts_stuck_workers() {
    let config = PipelineConfig {
        workers: 2,
        drain_timeout: Duration::from_secs(3),
        ..fast_config()
    };
    let (sink, mut events) = ChannelSink::new();
    // A single burst of 30 items; both workers stall on the first two.
    let pipeline = Pipeline::new(config, Stuck, Constant(30), sink).unwrap();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(pipeline.run(shutdown.clone()));
    tokio::time::sleep(Duration::from_secs(1)).await;
    shutdown.cancel();

    let report = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("pipeline ignored its drain timeout")
        .unwrap()
        .unwrap();

    let t = tally(&mut events);
    assert_eq!(t.bursts, 1);
    assert_eq!(t.generated, 30);
    assert_eq!(t.processed + t.failed, 0);
    assert_eq!(
        report,
        RunReport {
            aborted_workers: 2,
            interrupted: 2,
            discarded: 28,
        }
    );
    assert_eq!(report.lost(), 30);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let config = PipelineConfig {
        workers: 0,
        ..PipelineConfig::default()
    };
    let (sink, _events) = ChannelSink::new();

    let err = Pipeline::standard(config, ThreadRandom, sink).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}
