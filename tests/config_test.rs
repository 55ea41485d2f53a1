use std::collections::HashMap;
use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Duration;

use burstq::config::{Config, PipelineConfig};
use burstq::error::Error;
use burstq::model::ItemRange;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn defaults_match_reference_behavior() {
    let config = Config::load(None, vars(&[])).unwrap();
    let p = &config.pipeline;

    assert_eq!(p.workers, 8);
    assert_eq!(p.queue_capacity, None);
    assert_eq!(p.burst_interval, Duration::from_secs(5));
    assert_eq!(p.burst_max, 50);
    assert_eq!(p.item_range, ItemRange::new(1_000, 1_000_000));
    assert_eq!(p.latency_max, Duration::from_secs(10));
    assert_eq!(config.log_level, "info");
    assert!(config.otel_endpoint.is_none());
}

#[test]
fn environment_overrides_defaults() {
    let config = Config::load(
        None,
        vars(&[
            ("BURSTQ_WORKERS", "2"),
            ("BURSTQ_QUEUE_CAPACITY", "16"),
            ("BURSTQ_BURST_INTERVAL_SECS", "0.5"),
            ("BURSTQ_BURST_MAX", "5"),
            ("BURSTQ_ITEM_MIN", "10"),
            ("BURSTQ_ITEM_MAX", "20"),
            ("BURSTQ_LATENCY_MAX_SECS", "0"),
            ("OTEL_ENDPOINT", "http://localhost:4317"),
            ("LOG_LEVEL", "debug"),
        ]),
    )
    .unwrap();
    let p = &config.pipeline;

    assert_eq!(p.workers, 2);
    assert_eq!(p.queue_capacity, NonZeroUsize::new(16));
    assert_eq!(p.burst_interval, Duration::from_millis(500));
    assert_eq!(p.burst_max, 5);
    assert_eq!(p.item_range, ItemRange::new(10, 20));
    assert_eq!(p.latency_max, Duration::ZERO);
    assert_eq!(config.otel_endpoint.as_deref(), Some("http://localhost:4317"));
    assert_eq!(config.log_level, "debug");
}

#[test]
fn file_is_applied_before_environment() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "workers = 3\nburst_max = 7\nlatency_max_secs = 2.5\nlog_level = \"warn\""
    )
    .unwrap();

    let config = Config::load(Some(file.path()), vars(&[("BURSTQ_WORKERS", "5")])).unwrap();

    assert_eq!(config.pipeline.workers, 5);
    assert_eq!(config.pipeline.burst_max, 7);
    assert_eq!(config.pipeline.latency_max, Duration::from_millis(2_500));
    assert_eq!(config.log_level, "warn");
}

#[test]
fn unknown_file_keys_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "wrokers = 3").unwrap();

    let err = Config::load(Some(file.path()), vars(&[])).unwrap_err();
    assert!(matches!(err, Error::Toml(_)));
}

#[test]
fn missing_file_is_an_error() {
    let err = Config::load(Some("/nonexistent/burstq.toml".as_ref()), vars(&[])).unwrap_err();
    assert!(matches!(err, Error::ConfigFile { .. }));
}

#[test]
fn unparsable_values_fail_fast() {
    for (name, value) in [
        ("BURSTQ_WORKERS", "many"),
        ("BURSTQ_BURST_INTERVAL_SECS", "-1"),
        ("BURSTQ_LATENCY_MAX_SECS", "NaN"),
        ("BURSTQ_QUEUE_CAPACITY", "0"),
    ] {
        let result = Config::load(None, vars(&[(name, value)]));
        assert!(
            matches!(result, Err(Error::Config(_))),
            "{name}={value} should be rejected"
        );
    }
}

#[test]
fn validation_rejects_degenerate_pipelines() {
    let cases = [
        PipelineConfig {
            workers: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            burst_max: 0,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            item_range: ItemRange::new(10, 10),
            ..PipelineConfig::default()
        },
        PipelineConfig {
            item_range: ItemRange::new(0, 10),
            ..PipelineConfig::default()
        },
        PipelineConfig {
            burst_interval: Duration::ZERO,
            ..PipelineConfig::default()
        },
        PipelineConfig {
            drain_timeout: Duration::ZERO,
            ..PipelineConfig::default()
        },
    ];

    for config in cases {
        assert!(config.validate().is_err(), "{config:?} should be invalid");
    }
    assert!(PipelineConfig::default().validate().is_ok());
}
