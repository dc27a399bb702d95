//! Prometheus metrics for the Order Service
//!
//! - `order_service_orders_total` (counter) - order outcomes by result
//! - `order_service_processing_delay_seconds` (histogram) - simulated order delay
//! - `order_service_inventory_checks_total` (counter) - inventory checks by result

use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Order service metrics
pub struct ServiceMetrics {
    registry: Arc<Registry>,

    /// Orders by outcome (success, failure, database_error)
    orders_total: CounterVec,

    /// Simulated order delay in seconds
    processing_delay_seconds: Histogram,

    /// Inventory checks by result (ok, unavailable)
    inventory_checks_total: CounterVec,
}

impl ServiceMetrics {
    /// Create metrics on a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create metrics and register them with the provided registry
    pub fn with_registry(registry: Arc<Registry>) -> prometheus::Result<Self> {
        let orders_total = CounterVec::new(
            Opts::new("orders_total", "Total number of order creation attempts by result")
                .namespace("order_service"),
            &["result"],
        )?;

        let processing_delay_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "processing_delay_seconds",
                "Simulated order processing delay in seconds",
            )
            .namespace("order_service")
            .buckets(vec![0.1, 0.15, 0.2, 0.25, 0.3]),
        )?;

        let inventory_checks_total = CounterVec::new(
            Opts::new("inventory_checks_total", "Total number of inventory checks by result")
                .namespace("order_service"),
            &["result"],
        )?;

        registry.register(Box::new(orders_total.clone()))?;
        registry.register(Box::new(processing_delay_seconds.clone()))?;
        registry.register(Box::new(inventory_checks_total.clone()))?;

        Ok(Self {
            registry,
            orders_total,
            processing_delay_seconds,
            inventory_checks_total,
        })
    }

    /// Record an order outcome
    pub fn record_order(&self, result: &str) {
        self.orders_total.with_label_values(&[result]).inc();
    }

    /// Observe the simulated delay of an order
    pub fn observe_order_delay(&self, delay_ms: u32) {
        self.processing_delay_seconds
            .observe(f64::from(delay_ms) / 1000.0);
    }

    /// Record an inventory check
    pub fn record_inventory_check(&self, available: bool) {
        let result = if available { "ok" } else { "unavailable" };
        self.inventory_checks_total.with_label_values(&[result]).inc();
    }

    pub fn orders(&self, result: &str) -> u64 {
        self.orders_total.with_label_values(&[result]).get() as u64
    }

    pub fn inventory_checks(&self, available: bool) -> u64 {
        let result = if available { "ok" } else { "unavailable" };
        self.inventory_checks_total.with_label_values(&[result]).get() as u64
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
