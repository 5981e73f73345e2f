//! Read-only drift check between the movement ledger and cached balances.
//!
//! The cached `Balances` on a SKU row are a write-through cache of the
//! ledger. Replaying the full movement history through the effect table must
//! land on the same numbers; when it does not, something wrote past the
//! engine and the row needs reconciliation.

use serde::Serialize;

use atelier_core::SkuId;
use atelier_ledger::{Balances, replay_for};

use crate::engine::EngineResult;
use crate::store::{MovementFilter, StockStore};

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub sku_id: SkuId,
    pub cached: Balances,
    pub replayed: Balances,
    pub movement_count: usize,
    pub consistent: bool,
}

pub fn audit_sku<S: StockStore>(store: &S, sku_id: SkuId) -> EngineResult<AuditReport> {
    let sku = store.read_sku(sku_id)?;
    let mut movements = store.list_movements(&MovementFilter::for_sku(sku_id))?;
    // listing order is newest first; replay wants chronological
    movements.reverse();
    let replayed = replay_for(sku_id, &movements);

    Ok(AuditReport {
        sku_id,
        cached: sku.balances,
        replayed,
        movement_count: movements.len(),
        consistent: sku.balances == replayed,
    })
}
