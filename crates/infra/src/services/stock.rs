use std::cmp::Ordering;
use std::sync::Arc;

use atelier_core::{DomainError, SkuId, VariantKey};
use atelier_ledger::{Movement, MovementDraft, MovementKind};

use crate::engine::{EngineResult, MovementContext, StockEngine};
use crate::store::{MovementFilter, SkuRecord, StockStore};

use super::audit::{self, AuditReport};

/// Variant registry, manual corrections and purchase intake.
pub struct StockService<S> {
    engine: Arc<StockEngine<S>>,
}

impl<S: StockStore> StockService<S> {
    pub fn new(engine: Arc<StockEngine<S>>) -> Self {
        Self { engine }
    }

    /// Register a variant triple, returning the existing row when the triple
    /// is already known.
    pub fn register_variant(&self, key: &VariantKey) -> EngineResult<SkuRecord> {
        Ok(self.engine.store().find_or_create_sku(key)?)
    }

    pub fn sku(&self, id: SkuId) -> EngineResult<SkuRecord> {
        Ok(self.engine.store().read_sku(id)?)
    }

    pub fn skus(&self) -> EngineResult<Vec<SkuRecord>> {
        Ok(self.engine.store().list_skus()?)
    }

    pub fn movements(&self, filter: &MovementFilter) -> EngineResult<Vec<Movement>> {
        Ok(self.engine.store().list_movements(filter)?)
    }

    /// Signed manual adjustment. Positive deltas add stock, negative deltas
    /// remove it without a balance check (stocktake corrections must be able
    /// to drive a balance negative); zero is rejected.
    pub fn adjust(
        &self,
        sku_id: SkuId,
        delta: i64,
        note: Option<String>,
        actor: &str,
    ) -> EngineResult<SkuRecord> {
        let kind = match delta.cmp(&0) {
            Ordering::Greater => MovementKind::AdjustPositive,
            Ordering::Less => MovementKind::AdjustNegative,
            Ordering::Equal => {
                return Err(DomainError::validation("adjustment delta must be non-zero").into());
            }
        };

        let mut ctx = MovementContext::new(actor);
        if let Some(note) = note {
            ctx = ctx.with_note(note);
        }
        self.engine
            .apply(&MovementDraft::new(sku_id, kind, delta.abs()), &ctx)
    }

    /// Goods received from a supplier.
    pub fn receive_purchase(
        &self,
        sku_id: SkuId,
        quantity: i64,
        note: Option<String>,
        reference: Option<String>,
        actor: &str,
    ) -> EngineResult<SkuRecord> {
        let mut ctx = MovementContext::new(actor);
        if let Some(note) = note {
            ctx = ctx.with_note(note);
        }
        if let Some(reference) = reference {
            ctx = ctx.with_reference(reference);
        }
        self.engine.apply(
            &MovementDraft::new(sku_id, MovementKind::StockInPurchase, quantity),
            &ctx,
        )
    }

    /// Replay the SKU's ledger and compare with the cached balances.
    pub fn audit(&self, sku_id: SkuId) -> EngineResult<AuditReport> {
        audit::audit_sku(self.engine.store(), sku_id)
    }
}
