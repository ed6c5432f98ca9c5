/// Error types for every stage of the pipeline
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure while talking to sensor hardware through the platform
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("ADC read failed on {0}")]
    Adc(&'static str),
    #[error("I2C transaction failed: {0}")]
    I2c(String),
    #[error("could not parse driver value `{0}`")]
    Parse(String),
    #[error("invalid calendar value: {0}")]
    InvalidDateTime(String),
    #[error("sensor platform lock poisoned")]
    PlatformPoisoned,
}

/// Failure of the local log medium
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage medium not present at `{}`", .0.display())]
    MediumMissing(PathBuf),
    #[error("no log file has been created")]
    NoLogFile,
    #[error("I/O error on `{}`: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Failure on the peer link
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
    #[error("payload of {0} bytes exceeds the {1} byte frame limit")]
    PayloadTooLarge(usize, usize),
    #[error("could not serialize record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to rebuild a canonical packet from compact or JSON input
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("field {index} (`{column}`) has the wrong type")]
    FieldType { index: usize, column: &'static str },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}
