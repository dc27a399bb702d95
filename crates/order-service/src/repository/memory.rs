use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use super::{ensure_terminal, OrderRepository, StoreResult};
use crate::order::{OrderStatus, StoredOrder, WorkOrder};

/// Process-local order store.
#[derive(Debug)]
pub struct InMemoryOrderRepository {
    next_id: AtomicU64,
    orders: RwLock<Vec<StoredOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            orders: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryOrderRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: WorkOrder) -> StoreResult<StoredOrder> {
        ensure_terminal(&order)?;

        let stored = StoredOrder {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            order,
        };
        self.orders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stored.clone());

        tracing::debug!(order_id = stored.id, status = %stored.status(), "order inserted");
        Ok(stored)
    }

    fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64> {
        let orders = self.orders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(orders.iter().filter(|o| o.status() == status).count() as u64)
    }

    fn find_by_status(&self, status: OrderStatus) -> StoreResult<Vec<StoredOrder>> {
        let orders = self.orders.read().unwrap_or_else(PoisonError::into_inner);
        Ok(orders
            .iter()
            .filter(|o| o.status() == status)
            .cloned()
            .collect())
    }
}
