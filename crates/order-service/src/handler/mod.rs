//! HTTP handler for the Order Service
//!
//! Routes:
//! - `GET /createOrder` - run the instrumented order workflow
//! - `GET /checkInventory` - count orders after a simulated delay
//! - `GET /health` - liveness probe
//! - `GET /metrics` - Prometheus scrape endpoint

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::metrics::ServiceMetrics;
use crate::workflow::{InventoryReport, OrderOutcome, OrderWorkflow};

/// Application state
pub struct AppState {
    pub workflow: OrderWorkflow,
    pub metrics: Arc<ServiceMetrics>,
    pub service_name: String,
}

impl AppState {
    pub fn new(
        workflow: OrderWorkflow,
        metrics: Arc<ServiceMetrics>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            workflow,
            metrics,
            service_name: service_name.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/createOrder", get(create_order))
        .route("/checkInventory", get(check_inventory))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

impl IntoResponse for OrderOutcome {
    fn into_response(self) -> Response {
        let status = if self.is_success() {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, self.message()).into_response()
    }
}

impl IntoResponse for InventoryReport {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.to_string()).into_response()
    }
}

async fn create_order(State(state): State<Arc<AppState>>) -> OrderOutcome {
    state.workflow.create_order().await
}

async fn check_inventory(State(state): State<Arc<AppState>>) -> InventoryReport {
    state.workflow.check_inventory().await
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus text exposition
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
