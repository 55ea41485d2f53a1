//! burstq CLI: run the pipeline, or classify numbers by hand.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use burstq::classifier::{Classifier, FixedLatency, PrimeClassifier, UniformLatency};
use burstq::config::Config;
use burstq::engine::Pipeline;
use burstq::event::Event;
use burstq::model::WorkItem;
use burstq::random::{RandSource, SeededRandom, ThreadRandom};
use burstq::sink::{FanoutSink, JsonLinesSink, TracingSink};
use burstq::telemetry::{TelemetryConfig, init_telemetry};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "burstq", about = "Bursty producer, bounded worker pool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline until Ctrl-C, then drain
    Run {
        /// TOML config file, applied before environment variables
        #[arg(long)]
        config: Option<PathBuf>,
        /// Number of worker slots
        #[arg(long)]
        workers: Option<usize>,
        /// Bound the work queue (unbounded by default)
        #[arg(long)]
        queue_capacity: Option<NonZeroUsize>,
        /// Seed the random source for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
        /// Also write every event to stdout as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Classify the given numbers and print their outcomes
    Classify {
        numbers: Vec<u64>,
        /// Simulated latency upper bound in seconds (0 disables it)
        #[arg(long, default_value_t = 0.0)]
        latency_max_secs: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            workers,
            queue_capacity,
            seed,
            json,
        } => cmd_run(config, workers, queue_capacity, seed, json).await,
        Command::Classify {
            numbers,
            latency_max_secs,
        } => cmd_classify(numbers, latency_max_secs).await,
    }
}

async fn cmd_run(
    config_path: Option<PathBuf>,
    workers: Option<usize>,
    queue_capacity: Option<NonZeroUsize>,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load(config_path.as_deref(), |name| std::env::var(name).ok())?;
    if let Some(workers) = workers {
        config.pipeline.workers = workers;
    }
    if queue_capacity.is_some() {
        config.pipeline.queue_capacity = queue_capacity;
    }

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "burstq".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let mut sink = FanoutSink::new().with(TracingSink::new());
    if json {
        sink = sink.with(JsonLinesSink::stdout());
    }

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("interrupt received, shutting down");
        token.cancel();
    });

    match seed {
        Some(seed) => run_pipeline(config, Arc::new(SeededRandom::new(seed)), sink, shutdown).await,
        None => run_pipeline(config, ThreadRandom, sink, shutdown).await,
    }
}

async fn run_pipeline<R>(
    config: Config,
    rand: R,
    sink: FanoutSink,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    R: RandSource + Clone + 'static,
{
    let pipeline = Pipeline::standard(config.pipeline, rand, sink)?;
    let report = pipeline.run(shutdown).await?;
    if !report.is_clean() {
        anyhow::bail!(
            "shutdown deadline expired: {} items produced no event ({} interrupted, {} still queued)",
            report.lost(),
            report.interrupted,
            report.discarded
        );
    }
    Ok(())
}

async fn cmd_classify(numbers: Vec<u64>, latency_max_secs: f64) -> anyhow::Result<()> {
    let latency_max = Duration::try_from_secs_f64(latency_max_secs)
        .map_err(|e| anyhow::anyhow!("invalid --latency-max-secs {latency_max_secs}: {e}"))?;

    if latency_max.is_zero() {
        classify_all(&PrimeClassifier::new(FixedLatency::none()), numbers).await
    } else {
        let latency = UniformLatency::new(latency_max, ThreadRandom);
        classify_all(&PrimeClassifier::new(latency), numbers).await
    }
}

async fn classify_all(classifier: &impl Classifier, numbers: Vec<u64>) -> anyhow::Result<()> {
    if numbers.is_empty() {
        anyhow::bail!("no numbers given");
    }
    if numbers.contains(&0) {
        anyhow::bail!("numbers must be positive");
    }

    for number in numbers {
        let item = WorkItem::new(number);
        let outcome = classifier.classify(item).await;
        println!("{}", serde_json::to_string(&Event::outcome(item, outcome))?);
    }
    Ok(())
}
