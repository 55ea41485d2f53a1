//! Error types for burstq.
//!
//! Per-item failures are not errors: they are [`crate::model::FailureReason`]s
//! reported as events. This enum covers the ambient failures around the
//! pipeline (configuration, queue closure, task joins, telemetry setup).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("work queue closed")]
    QueueClosed,

    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

pub type Result<T> = std::result::Result<T, Error>;
