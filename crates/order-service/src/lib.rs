//! Order Service
//!
//! Demonstration HTTP service: two endpoints simulate order creation and
//! inventory checks against a record store, with artificial latency and span
//! instrumentation layered on top.
//!
//! # Outcomes
//! - Success: order persisted as `SUCCESS`, HTTP 200
//! - Business failure: injected ~10% of the time, persisted as `FAILED`, HTTP 500
//! - Infrastructure failure: the store errored, HTTP 500 with the error message
//!
//! # Design Principles
//! - Injected: randomness, store and tracer are passed in, never global
//! - Scoped: the workflow span is ended exactly once on every exit path
//! - Contained: failures become responses at the workflow boundary

pub mod config;
pub mod error;
pub mod handler;
pub mod metrics;
pub mod order;
pub mod random;
pub mod repository;
pub mod telemetry;
pub mod workflow;

pub use config::{ServiceConfig, SimulationConfig, StoreBackend, TracerBackend};
pub use error::{Result, ServiceError};
pub use order::{OrderId, OrderStatus, StoredOrder, WorkOrder};
pub use workflow::{InventoryReport, OrderOutcome, OrderWorkflow};
