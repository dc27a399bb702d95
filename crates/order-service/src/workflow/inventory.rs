//! Inventory check: an uninstrumented read path.

use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use super::OrderWorkflow;
use crate::order::OrderStatus;
use crate::repository::StoreResult;

/// Order counts observed by an inventory check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventoryCounts {
    pub successful: u64,
    pub failed: u64,
}

/// Result of one inventory check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryReport {
    /// Simulated delay in milliseconds
    pub delay_ms: u32,

    /// `None` when the store could not be counted
    pub counts: Option<InventoryCounts>,
}

impl InventoryReport {
    pub fn is_available(&self) -> bool {
        self.counts.is_some()
    }
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.counts {
            Some(counts) => write!(
                f,
                "Inventory check completed in {}ms. Orders: {} successful, {} failed",
                self.delay_ms, counts.successful, counts.failed
            ),
            None => write!(
                f,
                "Inventory check completed in {}ms. Database unavailable.",
                self.delay_ms
            ),
        }
    }
}

impl OrderWorkflow {
    /// Simulate a slow inventory lookup and count orders by status.
    ///
    /// Store errors are reported as an unavailable database and never
    /// annotate a span.
    pub async fn check_inventory(&self) -> InventoryReport {
        let delay_ms = self.random.between(
            self.simulation.inventory_delay_ms.start,
            self.simulation.inventory_delay_ms.end,
        );
        tokio::time::sleep(Duration::from_millis(u64::from(delay_ms))).await;

        let counts = match self.count_orders() {
            Ok(counts) => {
                info!(
                    delay_ms,
                    successful = counts.successful,
                    failed = counts.failed,
                    "inventory check completed"
                );
                Some(counts)
            }
            Err(err) => {
                warn!(delay_ms, error = %err, error_type = err.kind(), "inventory check could not reach the store");
                None
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_inventory_check(counts.is_some());
        }

        InventoryReport { delay_ms, counts }
    }

    fn count_orders(&self) -> StoreResult<InventoryCounts> {
        Ok(InventoryCounts {
            successful: self.repository.count_by_status(OrderStatus::Success)?,
            failed: self.repository.count_by_status(OrderStatus::Failed)?,
        })
    }
}
