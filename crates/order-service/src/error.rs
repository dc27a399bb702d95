//! Error types for the Order Service
//!
//! Request handling never fails: workflow failures become responses. These
//! errors cover service startup.

use thiserror::Error;

use crate::config::ConfigError;
use crate::repository::StoreError;

/// Main error type for service setup
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Order store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Metric registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Socket or file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracer backend error
    #[error("Tracing error: {0}")]
    Trace(#[from] order_span::TraceError),
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
