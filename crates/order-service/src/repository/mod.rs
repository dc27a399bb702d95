//! Order persistence
//!
//! The workflow only needs an insert that assigns an identifier and an
//! equality-filtered count. Two backends are provided:
//! - `memory` - process-local store, ids start at 1
//! - `sled_store` - embedded on-disk store, ids from sled's id generator

mod memory;
mod sled_store;

pub use self::memory::InMemoryOrderRepository;
pub use self::sled_store::SledOrderRepository;

use std::sync::Arc;

use thiserror::Error;

use crate::config::StoreBackend;
use crate::order::{OrderStatus, StoredOrder, WorkOrder};

/// Errors raised by order stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached or has been shut down
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Error reported by the storage engine
    #[error("Storage backend error: {0}")]
    Backend(#[from] sled::Error),

    /// Stored bytes could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record breaks a store invariant
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    /// Short category name, recorded as `error.type` on spans.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "Unavailable",
            StoreError::Backend(_) => "BackendError",
            StoreError::Serialization(_) => "SerializationError",
            StoreError::InvalidRecord(_) => "InvalidRecord",
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Record store for orders.
///
/// Implementations provide their own atomicity for single inserts and counts.
pub trait OrderRepository: Send + Sync {
    /// Persist an order and return it with its new identifier.
    ///
    /// Orders still in `PROCESSING` are rejected.
    fn insert(&self, order: WorkOrder) -> StoreResult<StoredOrder>;

    /// Number of stored orders with the given status.
    fn count_by_status(&self, status: OrderStatus) -> StoreResult<u64>;

    /// Stored orders with the given status, in insertion order.
    fn find_by_status(&self, status: OrderStatus) -> StoreResult<Vec<StoredOrder>>;
}

/// Open the store selected by configuration.
pub fn open(backend: &StoreBackend) -> StoreResult<Arc<dyn OrderRepository>> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryOrderRepository::new())),
        StoreBackend::Sled { path } => Ok(Arc::new(SledOrderRepository::open(path)?)),
    }
}

pub(crate) fn ensure_terminal(order: &WorkOrder) -> StoreResult<()> {
    if order.status.is_terminal() {
        Ok(())
    } else {
        Err(StoreError::InvalidRecord(format!(
            "order status {} is not terminal",
            order.status
        )))
    }
}
