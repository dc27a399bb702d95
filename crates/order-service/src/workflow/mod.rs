//! Instrumented order workflow
//!
//! `create_order` simulates latency, opens the `db_process_order` span,
//! decides the outcome from an injected random draw, persists the order once
//! and annotates the span with what happened. The span is owned by a
//! `SpanGuard` and ends when the guard drops, on every path.

mod inventory;

pub use inventory::{InventoryCounts, InventoryReport};

use std::sync::Arc;
use std::time::Duration;

use order_span::{KeyValue, SpanGuard, SpanKind, Tracer};
use tracing::{info, warn};

use crate::config::{self, SimulationConfig};
use crate::metrics::ServiceMetrics;
use crate::order::{OrderId, OrderStatus, WorkOrder};
use crate::random::RandomSource;
use crate::repository::{OrderRepository, StoreError, StoreResult};

/// Name of the span wrapping order persistence
pub const DB_SPAN_NAME: &str = "db_process_order";

pub const ATTR_DB_OPERATION: &str = "db.operation";
pub const ATTR_DB_TABLE: &str = "db.table";
pub const ATTR_PROCESSING_DELAY_MS: &str = "processing.delay.ms";
pub const ATTR_ORDER_RESULT: &str = "order.result";
pub const ATTR_ORDER_ID: &str = "order.id";
pub const ATTR_ORDER_STATUS: &str = "order.status";
pub const ATTR_FAILURE_REASON: &str = "failure.reason";
pub const ATTR_ERROR_MESSAGE: &str = "error.message";
pub const ATTR_ERROR_TYPE: &str = "error.type";

pub const EVENT_ORDER_SUCCEEDED: &str = "order_creation_succeeded";
pub const EVENT_ORDER_FAILED: &str = "order_creation_failed";
pub const EVENT_DATABASE_ERROR: &str = "database_error";

pub const SIMULATED_FAILURE_REASON: &str = "simulated_random_failure";

/// Result of one `create_order` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Order persisted as `SUCCESS`
    Success { id: OrderId },
    /// Order persisted as `FAILED` by the injected fault
    BusinessFailure { id: OrderId },
    /// The store failed; nothing was persisted
    InfrastructureFailure { message: String },
}

impl OrderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OrderOutcome::Success { .. })
    }

    /// Identifier of the persisted order, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            OrderOutcome::Success { id } | OrderOutcome::BusinessFailure { id } => Some(*id),
            OrderOutcome::InfrastructureFailure { .. } => None,
        }
    }

    /// Value recorded as `order.result`.
    pub fn result_label(&self) -> &'static str {
        match self {
            OrderOutcome::Success { .. } => "success",
            OrderOutcome::BusinessFailure { .. } => "failure",
            OrderOutcome::InfrastructureFailure { .. } => "database_error",
        }
    }

    /// Plain-text message returned to the caller.
    pub fn message(&self) -> String {
        match self {
            OrderOutcome::Success { id } => {
                format!("Order created successfully with ID: {}", id)
            }
            OrderOutcome::BusinessFailure { id } => format!(
                "Failed to create order due to internal error. Order ID: {}",
                id
            ),
            OrderOutcome::InfrastructureFailure { message } => {
                format!("Database error occurred: {}", message)
            }
        }
    }
}

/// Whether an outcome draw lands in the success region.
pub fn draws_success(random: &dyn RandomSource, simulation: &SimulationConfig) -> bool {
    random.next_below(simulation.outcome_range) < simulation.success_threshold
}

/// Order creation and inventory workflow
pub struct OrderWorkflow {
    repository: Arc<dyn OrderRepository>,
    tracer: Arc<dyn Tracer>,
    random: Arc<dyn RandomSource>,
    simulation: SimulationConfig,
    metrics: Option<Arc<ServiceMetrics>>,
}

impl OrderWorkflow {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        tracer: Arc<dyn Tracer>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            repository,
            tracer,
            random,
            simulation: SimulationConfig::default(),
            metrics: None,
        }
    }

    /// Replace the simulation parameters. Rejects ranges that cannot be drawn from.
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> config::Result<Self> {
        simulation.validate()?;
        self.simulation = simulation;
        Ok(self)
    }

    pub fn with_metrics(mut self, metrics: Arc<ServiceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Create one order.
    ///
    /// Never fails: store errors are reported as
    /// `OrderOutcome::InfrastructureFailure`. No retry is attempted.
    pub async fn create_order(&self) -> OrderOutcome {
        let delay_ms = self.random.between(
            self.simulation.order_delay_ms.start,
            self.simulation.order_delay_ms.end,
        );
        tokio::time::sleep(Duration::from_millis(u64::from(delay_ms))).await;

        let mut span = SpanGuard::start(
            self.tracer.as_ref(),
            DB_SPAN_NAME,
            SpanKind::Internal,
            vec![
                KeyValue::new(ATTR_DB_OPERATION, "insert"),
                KeyValue::new(ATTR_DB_TABLE, "orders"),
                KeyValue::new(ATTR_PROCESSING_DELAY_MS, delay_ms),
            ],
        );

        let outcome = match self.process_order(&mut span, delay_ms) {
            Ok(outcome) => outcome,
            Err(err) => record_database_error(&mut span, &err),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_order(outcome.result_label());
            metrics.observe_order_delay(delay_ms);
        }

        match &outcome {
            OrderOutcome::InfrastructureFailure { message } => {
                warn!(delay_ms, error = %message, "order creation hit a database error")
            }
            _ => info!(
                delay_ms,
                order_id = outcome.order_id(),
                result = outcome.result_label(),
                "order processed"
            ),
        }

        outcome
    }

    /// Instrumented region: build, decide, persist once, annotate.
    fn process_order(&self, span: &mut SpanGuard, delay_ms: u32) -> StoreResult<OrderOutcome> {
        let order = WorkOrder::new(delay_ms);

        if draws_success(self.random.as_ref(), &self.simulation) {
            let saved = self
                .repository
                .insert(order.with_status(OrderStatus::Success))?;
            let id = saved.id.to_string();

            span.add_event(
                EVENT_ORDER_SUCCEEDED,
                vec![
                    KeyValue::new(ATTR_ORDER_ID, id.clone()),
                    KeyValue::new(ATTR_ORDER_STATUS, OrderStatus::Success.as_str()),
                ],
            );
            span.set_attribute(ATTR_ORDER_RESULT, "success");
            span.set_attribute(ATTR_ORDER_ID, id);

            Ok(OrderOutcome::Success { id: saved.id })
        } else {
            let saved = self
                .repository
                .insert(order.with_status(OrderStatus::Failed))?;
            let id = saved.id.to_string();

            span.add_event(
                EVENT_ORDER_FAILED,
                vec![
                    KeyValue::new(ATTR_ORDER_ID, id.clone()),
                    KeyValue::new(ATTR_ORDER_STATUS, OrderStatus::Failed.as_str()),
                    KeyValue::new(ATTR_FAILURE_REASON, SIMULATED_FAILURE_REASON),
                ],
            );
            span.set_attribute(ATTR_ORDER_RESULT, "failure");
            span.set_attribute(ATTR_ORDER_ID, id);
            span.set_error_status("Order creation failed");

            Ok(OrderOutcome::BusinessFailure { id: saved.id })
        }
    }
}

fn record_database_error(span: &mut SpanGuard, err: &StoreError) -> OrderOutcome {
    let message = err.to_string();

    span.add_event(
        EVENT_DATABASE_ERROR,
        vec![
            KeyValue::new(ATTR_ERROR_MESSAGE, message.clone()),
            KeyValue::new(ATTR_ERROR_TYPE, err.kind()),
        ],
    );
    span.set_attribute(ATTR_ORDER_RESULT, "database_error");
    span.set_error_status(format!("Database error: {}", message));

    OrderOutcome::InfrastructureFailure { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::order::StoredOrder;
    use crate::random::{ScriptedRandom, SeededRandom};
    use crate::repository::InMemoryOrderRepository;
    use mockall::mock;
    use order_span::{RecordingTracer, SpanStatus};

    mock! {
        Repo {}
        impl OrderRepository for Repo {
            fn insert(&self, order: WorkOrder) -> StoreResult<StoredOrder>;
            fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64>;
            fn find_by_status(&self, status: OrderStatus) -> StoreResult<Vec<StoredOrder>>;
        }
    }

    fn workflow(
        repository: Arc<dyn OrderRepository>,
        tracer: &RecordingTracer,
        draws: impl IntoIterator<Item = u32>,
    ) -> OrderWorkflow {
        OrderWorkflow::new(
            repository,
            Arc::new(tracer.clone()),
            Arc::new(ScriptedRandom::new(draws)),
        )
    }

    fn string_attr(span: &order_span::RecordedSpan, key: &str) -> Option<String> {
        span.attribute(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_branch() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let tracer = RecordingTracer::new();
        let workflow = workflow(repo.clone(), &tracer, [50, 3]);

        let outcome = workflow.create_order().await;

        assert_eq!(outcome, OrderOutcome::Success { id: 1 });
        assert_eq!(outcome.message(), "Order created successfully with ID: 1");
        assert_eq!(repo.count_by_status(OrderStatus::Success).unwrap(), 1);

        assert_eq!(tracer.started_count(), 1);
        assert_eq!(tracer.ended_count(), 1);
        let span = tracer.last_span().unwrap();
        assert_eq!(span.name, DB_SPAN_NAME);
        assert_eq!(span.kind, SpanKind::Internal);
        assert_eq!(span.status, SpanStatus::Unset);
        assert_eq!(string_attr(&span, ATTR_DB_OPERATION).as_deref(), Some("insert"));
        assert_eq!(string_attr(&span, ATTR_DB_TABLE).as_deref(), Some("orders"));
        assert_eq!(
            span.attribute(ATTR_PROCESSING_DELAY_MS).and_then(|v| v.as_i64()),
            Some(150)
        );
        assert_eq!(string_attr(&span, ATTR_ORDER_RESULT).as_deref(), Some("success"));
        assert_eq!(string_attr(&span, ATTR_ORDER_ID).as_deref(), Some("1"));

        let event = span.event(EVENT_ORDER_SUCCEEDED).unwrap();
        assert_eq!(
            event.attribute(ATTR_ORDER_STATUS).and_then(|v| v.as_str()),
            Some("SUCCESS")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_branch_still_persists() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let tracer = RecordingTracer::new();
        let workflow = workflow(repo.clone(), &tracer, [0, 9]);

        let outcome = workflow.create_order().await;

        assert_eq!(outcome, OrderOutcome::BusinessFailure { id: 1 });
        assert_eq!(
            outcome.message(),
            "Failed to create order due to internal error. Order ID: 1"
        );
        let failed = repo.find_by_status(OrderStatus::Failed).unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].order.processing_time_ms, 100);

        let span = tracer.last_span().unwrap();
        assert_eq!(span.status, SpanStatus::Error);
        assert_eq!(span.error.as_deref(), Some("Order creation failed"));
        assert_eq!(string_attr(&span, ATTR_ORDER_RESULT).as_deref(), Some("failure"));

        let event = span.event(EVENT_ORDER_FAILED).unwrap();
        assert_eq!(
            event.attribute(ATTR_FAILURE_REASON).and_then(|v| v.as_str()),
            Some(SIMULATED_FAILURE_REASON)
        );
        assert_eq!(event.attribute(ATTR_ORDER_ID).and_then(|v| v.as_str()), Some("1"));
        assert_eq!(tracer.ended_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_error_is_traced_and_span_closed() {
        let mut repo = MockRepo::new();
        repo.expect_insert()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        let tracer = RecordingTracer::new();
        let workflow = workflow(Arc::new(repo), &tracer, [10, 2]);

        let outcome = workflow.create_order().await;

        let expected = "Store unavailable: connection refused".to_string();
        assert_eq!(
            outcome,
            OrderOutcome::InfrastructureFailure {
                message: expected.clone()
            }
        );
        assert_eq!(
            outcome.message(),
            "Database error occurred: Store unavailable: connection refused"
        );
        assert_eq!(outcome.order_id(), None);

        assert_eq!(tracer.started_count(), 1);
        assert_eq!(tracer.ended_count(), 1);
        let span = tracer.last_span().unwrap();
        assert_eq!(span.status, SpanStatus::Error);
        assert_eq!(span.error, Some(format!("Database error: {}", expected)));
        assert_eq!(
            string_attr(&span, ATTR_ORDER_RESULT).as_deref(),
            Some("database_error")
        );
        assert!(span.attribute(ATTR_ORDER_ID).is_none());

        let event = span.event(EVENT_DATABASE_ERROR).unwrap();
        assert_eq!(
            event.attribute(ATTR_ERROR_MESSAGE).and_then(|v| v.as_str()),
            Some(expected.as_str())
        );
        assert_eq!(
            event.attribute(ATTR_ERROR_TYPE).and_then(|v| v.as_str()),
            Some("Unavailable")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_insert_and_returned_id_matches_store() {
        let mut repo = MockRepo::new();
        repo.expect_insert()
            .times(1)
            .withf(|order| order.status == OrderStatus::Success && order.processing_time_ms == 100)
            .returning(|order| Ok(StoredOrder { id: 42, order }));
        let tracer = RecordingTracer::new();
        let workflow = workflow(Arc::new(repo), &tracer, [0, 0]);

        let outcome = workflow.create_order().await;

        assert_eq!(outcome.order_id(), Some(42));
        let span = tracer.last_span().unwrap();
        assert_eq!(string_attr(&span, ATTR_ORDER_ID).as_deref(), Some("42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_for_drawn_delay() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let tracer = RecordingTracer::new();
        let workflow = workflow(repo, &tracer, [199, 0]);

        let start = tokio::time::Instant::now();
        workflow.create_order().await;

        assert!(start.elapsed() >= Duration::from_millis(299));
        let span = tracer.last_span().unwrap();
        assert_eq!(
            span.attribute(ATTR_PROCESSING_DELAY_MS).and_then(|v| v.as_i64()),
            Some(299)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_invocation_closes_exactly_one_span() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let tracer = RecordingTracer::new();
        let workflow = OrderWorkflow::new(
            repo.clone(),
            Arc::new(tracer.clone()),
            Arc::new(SeededRandom::from_seed(7)),
        );

        for _ in 0..50 {
            let outcome = workflow.create_order().await;
            let delay = tracer
                .last_span()
                .and_then(|s| s.attribute(ATTR_PROCESSING_DELAY_MS).and_then(|v| v.as_i64()))
                .unwrap();
            assert!((100..300).contains(&delay));
            assert!(outcome.order_id().is_some());
        }

        assert_eq!(tracer.started_count(), 50);
        assert_eq!(tracer.ended_count(), 50);
        let persisted = repo.count_by_status(OrderStatus::Success).unwrap()
            + repo.count_by_status(OrderStatus::Failed).unwrap();
        assert_eq!(persisted, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_follow_outcomes() {
        let metrics = Arc::new(ServiceMetrics::new().unwrap());
        let tracer = RecordingTracer::new();
        let workflow = workflow(Arc::new(InMemoryOrderRepository::new()), &tracer, [0, 1, 0, 9])
            .with_metrics(metrics.clone());

        workflow.create_order().await;
        workflow.create_order().await;

        assert_eq!(metrics.orders("success"), 1);
        assert_eq!(metrics.orders("failure"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_unusable_simulation() {
        let tracer = RecordingTracer::new();
        let repo = Arc::new(InMemoryOrderRepository::new());

        let result = workflow(repo.clone(), &tracer, [0]).with_simulation(SimulationConfig {
            outcome_range: 0,
            ..SimulationConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidThreshold { .. })));

        let result = workflow(repo.clone(), &tracer, [0]).with_simulation(SimulationConfig {
            inventory_delay_ms: 800..200,
            ..SimulationConfig::default()
        });
        assert!(matches!(result, Err(ConfigError::InvalidRange { .. })));

        let workflow = workflow(repo, &tracer, [0, 1])
            .with_simulation(SimulationConfig {
                order_delay_ms: 10..20,
                success_threshold: 2,
                outcome_range: 4,
                ..SimulationConfig::default()
            })
            .unwrap();
        assert_eq!(workflow.create_order().await, OrderOutcome::Success { id: 1 });
        assert_eq!(
            tracer
                .last_span()
                .and_then(|s| s.attribute(ATTR_PROCESSING_DELAY_MS).and_then(|v| v.as_i64())),
            Some(10)
        );
    }

    #[test]
    fn test_success_ratio_converges_to_ninety_percent() {
        let random = SeededRandom::from_seed(2024);
        let simulation = SimulationConfig::default();
        let trials = 10_000;
        let successes = (0..trials)
            .filter(|_| draws_success(&random, &simulation))
            .count();

        let ratio = successes as f64 / trials as f64;
        assert!(ratio > 0.88 && ratio < 0.92, "ratio was {}", ratio);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(OrderOutcome::Success { id: 1 }.result_label(), "success");
        assert_eq!(OrderOutcome::BusinessFailure { id: 1 }.result_label(), "failure");
        assert_eq!(
            OrderOutcome::InfrastructureFailure {
                message: String::new()
            }
            .result_label(),
            "database_error"
        );
    }
}
