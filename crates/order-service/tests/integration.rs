//! Integration tests for the Order Service HTTP surface

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use order_service::handler::{create_router, AppState, HealthResponse};
use order_service::metrics::ServiceMetrics;
use order_service::random::{ScriptedRandom, SeededRandom};
use order_service::repository::{
    InMemoryOrderRepository, OrderRepository, SledOrderRepository, StoreError, StoreResult,
};
use order_service::{OrderStatus, OrderWorkflow, StoredOrder, WorkOrder};
use order_span::{RecordingTracer, SpanStatus};
use tower::ServiceExt;

/// Store whose every call fails as if the database were down.
struct BrokenStore;

impl OrderRepository for BrokenStore {
    fn insert(&self, _order: WorkOrder) -> StoreResult<StoredOrder> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn count_by_status(&self, _status: OrderStatus) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn find_by_status(&self, _status: OrderStatus) -> StoreResult<Vec<StoredOrder>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

struct TestApp {
    router: Router,
    tracer: RecordingTracer,
    metrics: Arc<ServiceMetrics>,
}

fn test_app(repository: Arc<dyn OrderRepository>, draws: Vec<u32>) -> TestApp {
    let tracer = RecordingTracer::new();
    let metrics = Arc::new(ServiceMetrics::new().unwrap());
    let workflow = OrderWorkflow::new(
        repository,
        Arc::new(tracer.clone()),
        Arc::new(ScriptedRandom::new(draws)),
    )
    .with_metrics(Arc::clone(&metrics));
    let state = Arc::new(AppState::new(workflow, Arc::clone(&metrics), "order-service"));

    TestApp {
        router: create_router(state),
        tracer,
        metrics,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_create_order_success() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let app = test_app(repo.clone(), vec![50, 3]);

    let (status, body) = get(&app.router, "/createOrder").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Order created successfully with ID: 1");
    assert_eq!(repo.count_by_status(OrderStatus::Success).unwrap(), 1);

    let span = app.tracer.last_span().unwrap();
    assert_eq!(span.name, "db_process_order");
    assert_eq!(span.status, SpanStatus::Unset);
    assert!(span.is_ended());
    assert_eq!(app.metrics.orders("success"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_create_order_simulated_failure() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let app = test_app(repo.clone(), vec![0, 9]);

    let (status, body) = get(&app.router, "/createOrder").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        "Failed to create order due to internal error. Order ID: 1"
    );
    assert_eq!(repo.count_by_status(OrderStatus::Failed).unwrap(), 1);

    let span = app.tracer.last_span().unwrap();
    assert_eq!(span.status, SpanStatus::Error);
    assert_eq!(span.error.as_deref(), Some("Order creation failed"));
    assert!(span.event("order_creation_failed").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_create_order_database_error() {
    let app = test_app(Arc::new(BrokenStore), vec![10, 1]);

    let (status, body) = get(&app.router, "/createOrder").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        "Database error occurred: Store unavailable: connection refused"
    );

    assert_eq!(app.tracer.started_count(), 1);
    assert_eq!(app.tracer.ended_count(), 1);
    let span = app.tracer.last_span().unwrap();
    assert_eq!(
        span.attribute("order.result").and_then(|v| v.as_str()),
        Some("database_error")
    );
    assert_eq!(
        span.error.as_deref(),
        Some("Database error: Store unavailable: connection refused")
    );
    assert_eq!(app.metrics.orders("database_error"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_check_inventory_counts() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    // Two orders (delay, outcome) then the inventory delay.
    let app = test_app(repo, vec![0, 0, 0, 9, 100]);

    get(&app.router, "/createOrder").await;
    get(&app.router, "/createOrder").await;
    let (status, body) = get(&app.router, "/checkInventory").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Inventory check completed in 300ms. Orders: 1 successful, 1 failed"
    );
    assert_eq!(app.tracer.started_count(), 2);
    assert_eq!(app.metrics.inventory_checks(true), 1);
}

#[tokio::test(start_paused = true)]
async fn test_check_inventory_database_unavailable() {
    let app = test_app(Arc::new(BrokenStore), vec![250]);

    let (status, body) = get(&app.router, "/checkInventory").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Inventory check completed in 450ms. Database unavailable."
    );
    assert_eq!(app.tracer.started_count(), 0);
    assert_eq!(app.metrics.inventory_checks(false), 1);
}

#[tokio::test(start_paused = true)]
async fn test_orders_persist_in_sled_store() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(SledOrderRepository::open(dir.path().join("orders")).unwrap());
    let app = test_app(repo.clone(), vec![0, 0, 0, 0, 0]);

    let (first, _) = get(&app.router, "/createOrder").await;
    let (second, _) = get(&app.router, "/createOrder").await;
    let (_, inventory) = get(&app.router, "/checkInventory").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(
        inventory,
        "Inventory check completed in 200ms. Orders: 2 successful, 0 failed"
    );

    let stored = repo.find_by_status(OrderStatus::Success).unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|order| order.order.processing_time_ms == 100));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_requests_get_distinct_ids() {
    let repo = Arc::new(InMemoryOrderRepository::new());
    let tracer = RecordingTracer::new();
    let metrics = Arc::new(ServiceMetrics::new().unwrap());
    let workflow = OrderWorkflow::new(
        repo.clone(),
        Arc::new(tracer.clone()),
        Arc::new(SeededRandom::from_seed(11)),
    );
    let router = create_router(Arc::new(AppState::new(workflow, metrics, "order-service")));

    let requests = (0..20).map(|_| {
        let router = router.clone();
        tokio::spawn(async move { get(&router, "/createOrder").await })
    });
    for handle in requests.collect::<Vec<_>>() {
        let (status, _) = handle.await.unwrap();
        assert!(status == StatusCode::OK || status == StatusCode::INTERNAL_SERVER_ERROR);
    }

    let mut ids: Vec<_> = repo
        .find_by_status(OrderStatus::Success)
        .unwrap()
        .into_iter()
        .chain(repo.find_by_status(OrderStatus::Failed).unwrap())
        .map(|order| order.id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
    assert_eq!(tracer.started_count(), 20);
    assert_eq!(tracer.ended_count(), 20);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(Arc::new(InMemoryOrderRepository::new()), Vec::new());

    let (status, body) = get(&app.router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.service, "order-service");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test(start_paused = true)]
async fn test_metrics_endpoint() {
    let app = test_app(Arc::new(InMemoryOrderRepository::new()), vec![0, 0]);

    get(&app.router, "/createOrder").await;
    let (status, body) = get(&app.router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("order_service_orders_total{result=\"success\"} 1"));
    assert!(body.contains("order_service_processing_delay_seconds"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = test_app(Arc::new(InMemoryOrderRepository::new()), Vec::new());

    let (status, _) = get(&app.router, "/orders").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
