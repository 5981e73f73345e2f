//! Storage boundary for balances, the movement ledger and the documents
//! that drive them.
//!
//! The trait makes no storage assumptions: the in-memory implementation backs
//! tests and dev, the Postgres implementation backs production. Balance rows
//! carry a version for optimistic concurrency; the movement ledger is
//! append-only.

pub mod in_memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use atelier_core::{CutBatchId, ExpectedVersion, OrderId, ProductionOrderId, ReturnId, SkuId, VariantKey};
use atelier_cutwork::CutBatch;
use atelier_ledger::{Balances, Movement, MovementKind};
use atelier_orders::Order;
use atelier_production::ProductionOrder;
use atelier_returns::SalesReturn;

pub use in_memory::InMemoryStockStore;
pub use postgres::PostgresStockStore;

/// A stored SKU: identity, variant triple, cached balances and row version.
///
/// `balances` is a cache of the movement ledger, maintained by the engine.
/// `version` increments on every balance commit and backs the
/// `ExpectedVersion` check in [`StockStore::upsert_sku`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuRecord {
    pub id: SkuId,
    pub key: VariantKey,
    pub balances: Balances,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

/// Filter for ledger reads. All fields are optional; results come back
/// newest first.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub sku_id: Option<SkuId>,
    pub kind: Option<MovementKind>,
    pub reference: Option<String>,
    pub limit: Option<usize>,
}

impl MovementFilter {
    pub fn for_sku(sku_id: SkuId) -> Self {
        Self {
            sku_id: Some(sku_id),
            ..Self::default()
        }
    }

    pub(crate) fn matches(&self, movement: &Movement) -> bool {
        if let Some(sku_id) = self.sku_id {
            if movement.sku_id != sku_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if movement.kind != kind {
                return false;
            }
        }
        if let Some(reference) = &self.reference {
            if movement.reference.as_deref() != Some(reference.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Storage operation error.
///
/// Infrastructure failures only; domain rule violations are `DomainError`
/// and never originate here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("version conflict: {0}")]
    VersionConflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Remote stock store.
///
/// Sync and object-safe so services can hold an `Arc<dyn StockStore>`; the
/// Postgres implementation bridges into async internally. Implementations
/// must:
/// - keep one SKU row per normalized variant triple
/// - enforce `ExpectedVersion` on balance commits
/// - keep the movement ledger append-only (no update, no delete)
pub trait StockStore: Send + Sync {
    // SKU rows
    fn read_sku(&self, id: SkuId) -> Result<SkuRecord, StoreError>;
    fn find_sku(&self, key: &VariantKey) -> Result<Option<SkuRecord>, StoreError>;
    /// Look the triple up, creating a zero-balance row when absent.
    fn find_or_create_sku(&self, key: &VariantKey) -> Result<SkuRecord, StoreError>;
    /// Commit new balances for an existing row, guarded by `expected`.
    fn upsert_sku(
        &self,
        id: SkuId,
        balances: Balances,
        expected: ExpectedVersion,
    ) -> Result<SkuRecord, StoreError>;
    fn list_skus(&self) -> Result<Vec<SkuRecord>, StoreError>;

    // Movement ledger (append-only)
    fn insert_movement(&self, movement: &Movement) -> Result<(), StoreError>;
    fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError>;

    // Orders
    /// Insert and return the stored copy with its assigned document number.
    fn insert_order(&self, order: &Order) -> Result<Order, StoreError>;
    fn read_order(&self, id: OrderId) -> Result<Order, StoreError>;
    fn update_order(&self, order: &Order) -> Result<(), StoreError>;
    /// Removes a header whose reservations could not be applied.
    fn delete_order(&self, id: OrderId) -> Result<(), StoreError>;
    fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    // Production orders
    fn insert_production_order(&self, order: &ProductionOrder) -> Result<ProductionOrder, StoreError>;
    fn read_production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder, StoreError>;
    fn update_production_order(&self, order: &ProductionOrder) -> Result<(), StoreError>;
    fn list_production_orders(&self) -> Result<Vec<ProductionOrder>, StoreError>;

    // Customer returns
    fn insert_return(&self, sales_return: &SalesReturn) -> Result<SalesReturn, StoreError>;
    fn delete_return(&self, id: ReturnId) -> Result<(), StoreError>;
    fn list_returns(&self) -> Result<Vec<SalesReturn>, StoreError>;

    // Cut batches (externally owned; this side only reads and marks)
    fn read_cut_batch(&self, id: CutBatchId) -> Result<CutBatch, StoreError>;
    fn upsert_cut_batch(&self, batch: &CutBatch) -> Result<(), StoreError>;
    fn write_cut_batch_sync_marker(
        &self,
        id: CutBatchId,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;
    fn list_cut_batches(&self) -> Result<Vec<CutBatch>, StoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn read_sku(&self, id: SkuId) -> Result<SkuRecord, StoreError> {
        (**self).read_sku(id)
    }

    fn find_sku(&self, key: &VariantKey) -> Result<Option<SkuRecord>, StoreError> {
        (**self).find_sku(key)
    }

    fn find_or_create_sku(&self, key: &VariantKey) -> Result<SkuRecord, StoreError> {
        (**self).find_or_create_sku(key)
    }

    fn upsert_sku(
        &self,
        id: SkuId,
        balances: Balances,
        expected: ExpectedVersion,
    ) -> Result<SkuRecord, StoreError> {
        (**self).upsert_sku(id, balances, expected)
    }

    fn list_skus(&self) -> Result<Vec<SkuRecord>, StoreError> {
        (**self).list_skus()
    }

    fn insert_movement(&self, movement: &Movement) -> Result<(), StoreError> {
        (**self).insert_movement(movement)
    }

    fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        (**self).list_movements(filter)
    }

    fn insert_order(&self, order: &Order) -> Result<Order, StoreError> {
        (**self).insert_order(order)
    }

    fn read_order(&self, id: OrderId) -> Result<Order, StoreError> {
        (**self).read_order(id)
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        (**self).update_order(order)
    }

    fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        (**self).delete_order(id)
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders()
    }

    fn insert_production_order(&self, order: &ProductionOrder) -> Result<ProductionOrder, StoreError> {
        (**self).insert_production_order(order)
    }

    fn read_production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder, StoreError> {
        (**self).read_production_order(id)
    }

    fn update_production_order(&self, order: &ProductionOrder) -> Result<(), StoreError> {
        (**self).update_production_order(order)
    }

    fn list_production_orders(&self) -> Result<Vec<ProductionOrder>, StoreError> {
        (**self).list_production_orders()
    }

    fn insert_return(&self, sales_return: &SalesReturn) -> Result<SalesReturn, StoreError> {
        (**self).insert_return(sales_return)
    }

    fn delete_return(&self, id: ReturnId) -> Result<(), StoreError> {
        (**self).delete_return(id)
    }

    fn list_returns(&self) -> Result<Vec<SalesReturn>, StoreError> {
        (**self).list_returns()
    }

    fn read_cut_batch(&self, id: CutBatchId) -> Result<CutBatch, StoreError> {
        (**self).read_cut_batch(id)
    }

    fn upsert_cut_batch(&self, batch: &CutBatch) -> Result<(), StoreError> {
        (**self).upsert_cut_batch(batch)
    }

    fn write_cut_batch_sync_marker(
        &self,
        id: CutBatchId,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        (**self).write_cut_batch_sync_marker(id, synced_at)
    }

    fn list_cut_batches(&self) -> Result<Vec<CutBatch>, StoreError> {
        (**self).list_cut_batches()
    }
}
