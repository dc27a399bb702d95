use std::path::Path;

use super::{ensure_terminal, OrderRepository, StoreResult};
use crate::order::{OrderStatus, StoredOrder, WorkOrder};

const ORDERS_TREE: &str = "orders";

/// Order store backed by an embedded sled database.
///
/// Orders are kept as JSON under their big-endian id, so iteration follows
/// insertion order.
#[derive(Debug, Clone)]
pub struct SledOrderRepository {
    db: sled::Db,
    orders: sled::Tree,
}

impl SledOrderRepository {
    /// Open (or create) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Open a database that is deleted when dropped.
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let orders = db.open_tree(ORDERS_TREE)?;
        Ok(Self { db, orders })
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> StoreResult<()> {
        self.orders.flush()?;
        Ok(())
    }

    fn scan(&self, status: OrderStatus) -> impl Iterator<Item = StoreResult<StoredOrder>> + '_ {
        self.orders
            .iter()
            .values()
            .map(|value| -> StoreResult<StoredOrder> { Ok(serde_json::from_slice(&value?)?) })
            .filter(move |order| match order {
                Ok(order) => order.status() == status,
                Err(_) => true,
            })
    }
}

impl OrderRepository for SledOrderRepository {
    fn insert(&self, order: WorkOrder) -> StoreResult<StoredOrder> {
        ensure_terminal(&order)?;

        let stored = StoredOrder {
            id: self.db.generate_id()? + 1,
            order,
        };
        let value = serde_json::to_vec(&stored)?;
        self.orders.insert(stored.id.to_be_bytes(), value)?;

        tracing::debug!(order_id = stored.id, status = %stored.status(), "order inserted");
        Ok(stored)
    }

    fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64> {
        let mut count = 0;
        for order in self.scan(status) {
            order?;
            count += 1;
        }
        Ok(count)
    }

    fn find_by_status(&self, status: OrderStatus) -> StoreResult<Vec<StoredOrder>> {
        self.scan(status).collect()
    }
}
