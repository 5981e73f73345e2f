use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use atelier_core::{CutBatchId, ExpectedVersion, OrderId, ProductionOrderId, ReturnId, SkuId, VariantKey};
use atelier_cutwork::CutBatch;
use atelier_ledger::{Balances, Movement};
use atelier_orders::Order;
use atelier_production::ProductionOrder;
use atelier_returns::SalesReturn;

use super::{MovementFilter, SkuRecord, StockStore, StoreError};

/// In-memory stock store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    skus: RwLock<HashMap<SkuId, SkuRecord>>,
    variants: RwLock<HashMap<VariantKey, SkuId>>,
    movements: RwLock<Vec<Movement>>,
    orders: RwLock<HashMap<OrderId, Order>>,
    production_orders: RwLock<HashMap<ProductionOrderId, ProductionOrder>>,
    returns: RwLock<Vec<SalesReturn>>,
    cut_batches: RwLock<HashMap<CutBatchId, CutBatch>>,
    order_numbers: AtomicU64,
    production_numbers: AtomicU64,
    return_numbers: AtomicU64,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }

    fn next_number(counter: &AtomicU64, prefix: &str) -> String {
        format!("{prefix}-{:04}", counter.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

impl StockStore for InMemoryStockStore {
    fn read_sku(&self, id: SkuId) -> Result<SkuRecord, StoreError> {
        let skus = self.skus.read().map_err(|_| Self::poisoned())?;
        skus.get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("sku {id}")))
    }

    fn find_sku(&self, key: &VariantKey) -> Result<Option<SkuRecord>, StoreError> {
        let variants = self.variants.read().map_err(|_| Self::poisoned())?;
        let Some(id) = variants.get(key) else {
            return Ok(None);
        };
        let skus = self.skus.read().map_err(|_| Self::poisoned())?;
        Ok(skus.get(id).cloned())
    }

    fn find_or_create_sku(&self, key: &VariantKey) -> Result<SkuRecord, StoreError> {
        // Write-lock the variant index across the lookup so two concurrent
        // callers cannot both miss and insert the same triple twice.
        let mut variants = self.variants.write().map_err(|_| Self::poisoned())?;
        let mut skus = self.skus.write().map_err(|_| Self::poisoned())?;

        if let Some(id) = variants.get(key) {
            return skus
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::Unavailable(format!("variant index points at missing sku {id}")));
        }

        let record = SkuRecord {
            id: SkuId::new(),
            key: key.clone(),
            balances: Balances::ZERO,
            version: 1,
            created_at: Utc::now(),
        };
        variants.insert(key.clone(), record.id);
        skus.insert(record.id, record.clone());
        Ok(record)
    }

    fn upsert_sku(
        &self,
        id: SkuId,
        balances: Balances,
        expected: ExpectedVersion,
    ) -> Result<SkuRecord, StoreError> {
        let mut skus = self.skus.write().map_err(|_| Self::poisoned())?;
        let record = skus
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("sku {id}")))?;

        if !expected.matches(record.version) {
            return Err(StoreError::VersionConflict(format!(
                "sku {id}: expected {expected:?}, found {}",
                record.version
            )));
        }

        record.balances = balances;
        record.version += 1;
        Ok(record.clone())
    }

    fn list_skus(&self) -> Result<Vec<SkuRecord>, StoreError> {
        let skus = self.skus.read().map_err(|_| Self::poisoned())?;
        let mut records: Vec<SkuRecord> = skus.values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }

    fn insert_movement(&self, movement: &Movement) -> Result<(), StoreError> {
        let mut movements = self.movements.write().map_err(|_| Self::poisoned())?;
        movements.push(movement.clone());
        Ok(())
    }

    fn list_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>, StoreError> {
        let movements = self.movements.read().map_err(|_| Self::poisoned())?;
        let mut matching: Vec<Movement> = movements
            .iter()
            .filter(|movement| filter.matches(movement))
            .cloned()
            .collect();
        matching.reverse();
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    fn insert_order(&self, order: &Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        let mut stored = order.clone();
        stored.number = Self::next_number(&self.order_numbers, "PED");
        orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn read_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    fn update_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        match orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("order {}", order.id))),
        }
    }

    fn delete_order(&self, id: OrderId) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(all)
    }

    fn insert_production_order(&self, order: &ProductionOrder) -> Result<ProductionOrder, StoreError> {
        let mut orders = self.production_orders.write().map_err(|_| Self::poisoned())?;
        let mut stored = order.clone();
        stored.number = Self::next_number(&self.production_numbers, "OP");
        orders.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn read_production_order(&self, id: ProductionOrderId) -> Result<ProductionOrder, StoreError> {
        let orders = self.production_orders.read().map_err(|_| Self::poisoned())?;
        orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("production order {id}")))
    }

    fn update_production_order(&self, order: &ProductionOrder) -> Result<(), StoreError> {
        let mut orders = self.production_orders.write().map_err(|_| Self::poisoned())?;
        match orders.get_mut(&order.id) {
            Some(slot) => {
                *slot = order.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("production order {}", order.id))),
        }
    }

    fn list_production_orders(&self) -> Result<Vec<ProductionOrder>, StoreError> {
        let orders = self.production_orders.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<ProductionOrder> = orders.values().cloned().collect();
        all.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(all)
    }

    fn insert_return(&self, sales_return: &SalesReturn) -> Result<SalesReturn, StoreError> {
        let mut returns = self.returns.write().map_err(|_| Self::poisoned())?;
        let mut stored = sales_return.clone();
        stored.number = Self::next_number(&self.return_numbers, "DEV");
        returns.push(stored.clone());
        Ok(stored)
    }

    fn delete_return(&self, id: ReturnId) -> Result<(), StoreError> {
        let mut returns = self.returns.write().map_err(|_| Self::poisoned())?;
        let before = returns.len();
        returns.retain(|sales_return| sales_return.id != id);
        if returns.len() == before {
            return Err(StoreError::NotFound(format!("return {id}")));
        }
        Ok(())
    }

    fn list_returns(&self) -> Result<Vec<SalesReturn>, StoreError> {
        let returns = self.returns.read().map_err(|_| Self::poisoned())?;
        Ok(returns.clone())
    }

    fn read_cut_batch(&self, id: CutBatchId) -> Result<CutBatch, StoreError> {
        let batches = self.cut_batches.read().map_err(|_| Self::poisoned())?;
        batches
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("cut batch {id}")))
    }

    fn upsert_cut_batch(&self, batch: &CutBatch) -> Result<(), StoreError> {
        let mut batches = self.cut_batches.write().map_err(|_| Self::poisoned())?;
        batches.insert(batch.id, batch.clone());
        Ok(())
    }

    fn write_cut_batch_sync_marker(
        &self,
        id: CutBatchId,
        synced_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut batches = self.cut_batches.write().map_err(|_| Self::poisoned())?;
        match batches.get_mut(&id) {
            Some(batch) => {
                batch.synced_at = synced_at;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("cut batch {id}"))),
        }
    }

    fn list_cut_batches(&self) -> Result<Vec<CutBatch>, StoreError> {
        let batches = self.cut_batches.read().map_err(|_| Self::poisoned())?;
        let mut all: Vec<CutBatch> = batches.values().cloned().collect();
        all.sort_by(|a, b| a.reference.cmp(&b.reference));
        Ok(all)
    }
}
