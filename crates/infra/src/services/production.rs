use std::sync::Arc;

use chrono::Utc;

use atelier_core::{ProductionOrderId, SkuId};
use atelier_production::{ProductionOrder, ProductionStatus};

use crate::engine::{EngineResult, MovementContext, StockEngine};
use crate::store::StockStore;

use super::degraded;

pub struct NewProductionOrder {
    pub sku_id: SkuId,
    pub quantity: i64,
    pub assignee: Option<String>,
    pub note: Option<String>,
}

/// Internal production lifecycle. Stock enters exactly once, on completion.
pub struct ProductionService<S> {
    engine: Arc<StockEngine<S>>,
}

impl<S: StockStore> ProductionService<S> {
    pub fn new(engine: Arc<StockEngine<S>>) -> Self {
        Self { engine }
    }

    pub fn create(&self, input: NewProductionOrder) -> EngineResult<ProductionOrder> {
        let order = ProductionOrder::create(
            input.sku_id,
            input.quantity,
            input.assignee,
            input.note,
            Utc::now(),
        )?;
        Ok(self.engine.store().insert_production_order(&order)?)
    }

    /// Advance one stage. The final stage books the produced quantity in.
    pub fn advance(&self, id: ProductionOrderId, actor: &str) -> EngineResult<ProductionOrder> {
        let mut order = self.engine.store().read_production_order(id)?;
        let target = order.advance_target()?;
        let drafts = order.entry_drafts(target);

        if !drafts.is_empty() {
            let ctx = MovementContext::new(actor)
                .with_note(format!("production intake for {}", order.number))
                .with_reference(order.number.clone());
            self.engine.apply_all(&drafts, &ctx)?;
        }

        order.apply_status(target, Utc::now());
        match self.engine.store().update_production_order(&order) {
            Ok(()) => Ok(order),
            Err(error) if drafts.is_empty() => Err(error.into()),
            Err(error) => Err(degraded(format!(
                "production order {} booked its stock in but the completion was not stored: {error}",
                order.number
            ))),
        }
    }

    /// Cancel a running order. Nothing was ever booked in, so nothing moves.
    pub fn cancel(&self, id: ProductionOrderId) -> EngineResult<ProductionOrder> {
        let mut order = self.engine.store().read_production_order(id)?;
        order.cancel_check()?;
        order.apply_status(ProductionStatus::Cancelled, Utc::now());
        self.engine.store().update_production_order(&order)?;
        Ok(order)
    }

    /// Reopen a completed order to an earlier stage, withdrawing the
    /// quantity its completion booked in.
    pub fn reopen(
        &self,
        id: ProductionOrderId,
        to: ProductionStatus,
        actor: &str,
    ) -> EngineResult<ProductionOrder> {
        let mut order = self.engine.store().read_production_order(id)?;
        let drafts = order.reopen_drafts(to)?;

        let ctx = MovementContext::new(actor)
            .with_note(format!("production order {} reopened", order.number))
            .with_reference(order.number.clone());
        self.engine.apply_all(&drafts, &ctx)?;

        order.apply_status(to, Utc::now());
        match self.engine.store().update_production_order(&order) {
            Ok(()) => Ok(order),
            Err(error) => Err(degraded(format!(
                "finished stock of production order {} was withdrawn but the reopen was not stored: {error}",
                order.number
            ))),
        }
    }

    pub fn get(&self, id: ProductionOrderId) -> EngineResult<ProductionOrder> {
        Ok(self.engine.store().read_production_order(id)?)
    }

    pub fn list(&self) -> EngineResult<Vec<ProductionOrder>> {
        Ok(self.engine.store().list_production_orders()?)
    }
}
