//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in the commands and the CLI.

use crate::tracer::TracerState;
use thiserror::Error;

/// Errors raised by the tracer control surface
///
/// All of these are local and non-retryable: the caller has to fix the call sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TracerError {
    #[error("Invalid key configuration: {0}")]
    Configuration(String),

    #[error("Tracing is already running (nested traces are not supported)")]
    AlreadyRunning,

    #[error("Cannot {operation}: tracer is {state}")]
    NotRunning {
        operation: &'static str,
        state: TracerState,
    },
}

/// Errors that can occur while reading an event log
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Invalid event on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while loading tracer configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error(transparent)]
    Tracer(#[from] TracerError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
