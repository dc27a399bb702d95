//! Service configuration.

use std::net::SocketAddr;
use std::ops::Range;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid range for {name}: {low}..{high}")]
    InvalidRange { name: &'static str, low: u32, high: u32 },

    #[error("Success threshold {threshold} exceeds outcome range {range}")]
    InvalidThreshold { threshold: u32, range: u32 },

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where orders are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sled { path: PathBuf },
}

impl StoreBackend {
    /// Parse a backend name, using `path` for on-disk stores.
    pub fn parse(name: &str, path: impl Into<PathBuf>) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sled" => Ok(StoreBackend::Sled { path: path.into() }),
            _ => Err(ConfigError::UnknownVariant {
                kind: "store backend",
                value: name.to_string(),
            }),
        }
    }
}

/// Where finished spans go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracerBackend {
    /// One structured log line per span
    Log,
    /// OpenTelemetry SDK with stdout exporter
    Otel,
    /// Retained in a bounded in-memory buffer and never exported. The
    /// service does not read them back, so at runtime this discards spans.
    Recording,
}

impl FromStr for TracerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "log" => Ok(TracerBackend::Log),
            "otel" | "opentelemetry" => Ok(TracerBackend::Otel),
            "recording" | "memory" => Ok(TracerBackend::Recording),
            _ => Err(ConfigError::UnknownVariant {
                kind: "tracer backend",
                value: s.to_string(),
            }),
        }
    }
}

/// Parameters of the simulated workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Delay before persisting an order, in milliseconds
    pub order_delay_ms: Range<u32>,

    /// Delay before counting orders, in milliseconds
    pub inventory_delay_ms: Range<u32>,

    /// Outcome draws below this value succeed
    pub success_threshold: u32,

    /// Outcome draws are taken from `[0, outcome_range)`
    pub outcome_range: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            order_delay_ms: 100..300,
            inventory_delay_ms: 200..800,
            success_threshold: 9,
            outcome_range: 10,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("order_delay_ms", &self.order_delay_ms)?;
        check_range("inventory_delay_ms", &self.inventory_delay_ms)?;
        if self.outcome_range == 0 || self.success_threshold > self.outcome_range {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.success_threshold,
                range: self.outcome_range,
            });
        }
        Ok(())
    }
}

fn check_range(name: &'static str, range: &Range<u32>) -> Result<()> {
    if range.start < range.end {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange {
            name,
            low: range.start,
            high: range.end,
        })
    }
}

/// Top-level service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Name reported on spans and by the health endpoint
    pub service_name: String,

    pub store: StoreBackend,

    pub tracer: TracerBackend,

    /// Seed for the random source; seeded from the OS when absent
    pub seed: Option<u64>,

    pub simulation: SimulationConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            service_name: "order-service".to_string(),
            store: StoreBackend::Memory,
            tracer: TracerBackend::Log,
            seed: None,
            simulation: SimulationConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create a new config builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(format!("{}:{}", self.host, self.port)))
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        self.simulation.validate()
    }
}

/// Builder for ServiceConfig
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    pub fn store(mut self, store: StoreBackend) -> Self {
        self.config.store = store;
        self
    }

    pub fn tracer(mut self, tracer: TracerBackend) -> Self {
        self.config.tracer = tracer;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn simulation(mut self, simulation: SimulationConfig) -> Self {
        self.config.simulation = simulation;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
