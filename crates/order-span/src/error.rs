//! Error types for tracer backends.

use thiserror::Error;

/// Errors raised by tracer backends
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to shut down tracer provider: {0}")]
    ShutdownFailed(String),
}

pub type Result<T> = std::result::Result<T, TraceError>;
