//! Logging and span backend setup.

use std::str::FromStr;
use std::sync::Arc;

use order_span::{
    install_stdout_provider, shutdown_provider, LogTracer, OtelTracer, RecordingTracer,
    TraceError, Tracer, TracerProvider,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ConfigError, TracerBackend};

/// Output format of the process log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::UnknownVariant {
                kind: "log format",
                value: s.to_string(),
            }),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// The span tracer selected at startup, plus whatever must be flushed on exit.
pub struct TracerSetup {
    tracer: Arc<dyn Tracer>,
    provider: Option<TracerProvider>,
    backend: TracerBackend,
}

impl TracerSetup {
    pub fn install(backend: TracerBackend, service_name: &str) -> Self {
        let (tracer, provider): (Arc<dyn Tracer>, Option<TracerProvider>) = match backend {
            TracerBackend::Log => (Arc::new(LogTracer::new(service_name)), None),
            TracerBackend::Otel => {
                let provider = install_stdout_provider(service_name);
                (Arc::new(OtelTracer::new(service_name)), Some(provider))
            }
            TracerBackend::Recording => (Arc::new(RecordingTracer::new()), None),
        };

        tracing::info!(backend = ?backend, service = service_name, "span tracer installed");

        Self {
            tracer,
            provider,
            backend,
        }
    }

    pub fn tracer(&self) -> Arc<dyn Tracer> {
        Arc::clone(&self.tracer)
    }

    pub fn backend(&self) -> TracerBackend {
        self.backend
    }

    /// Flush and release the backend.
    pub fn shutdown(self) -> Result<(), TraceError> {
        match &self.provider {
            Some(provider) => shutdown_provider(provider),
            None => Ok(()),
        }
    }
}
