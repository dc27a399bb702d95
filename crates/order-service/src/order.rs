//! Order record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the store on insert.
pub type OrderId = u64;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Initial in-memory status, never persisted.
    Processing,
    Success,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Success => "SUCCESS",
            OrderStatus::Failed => "FAILED",
        }
    }

    /// Whether the status may be persisted.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u32,
}

impl WorkOrder {
    /// New order in `PROCESSING` status.
    pub fn new(processing_time_ms: u32) -> Self {
        Self {
            status: OrderStatus::Processing,
            created_at: Utc::now(),
            processing_time_ms,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }
}

/// An order as returned by the store, carrying its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOrder {
    pub id: OrderId,
    #[serde(flatten)]
    pub order: WorkOrder,
}

impl StoredOrder {
    pub fn status(&self) -> OrderStatus {
        self.order.status
    }
}
