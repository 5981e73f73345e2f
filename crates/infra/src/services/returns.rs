use std::sync::Arc;

use chrono::Utc;

use atelier_core::OrderId;
use atelier_returns::{ReturnItem, SalesReturn};

use crate::engine::{EngineError, EngineResult, MovementContext, StockEngine};
use crate::store::StockStore;

use super::degraded;

pub struct NewReturn {
    pub order_id: OrderId,
    pub items: Vec<ReturnItem>,
    pub reason: String,
    pub note: Option<String>,
    pub actor: String,
}

/// Customer returns against dispatched orders. Returned units go back to
/// physical stock; the order itself is not touched.
pub struct ReturnService<S> {
    engine: Arc<StockEngine<S>>,
}

impl<S: StockStore> ReturnService<S> {
    pub fn new(engine: Arc<StockEngine<S>>) -> Self {
        Self { engine }
    }

    pub fn create(&self, input: NewReturn) -> EngineResult<SalesReturn> {
        let order = self.engine.store().read_order(input.order_id)?;
        let sales_return =
            SalesReturn::for_order(&order, input.items, input.reason, input.note, Utc::now())?;
        let stored = self.engine.store().insert_return(&sales_return)?;

        let ctx = MovementContext::new(&input.actor)
            .with_note(format!(
                "customer return {} against order {}",
                stored.number, order.number
            ))
            .with_reference(stored.number.clone());

        match self.engine.apply_all(&stored.drafts(), &ctx) {
            Ok(_) => Ok(stored),
            Err(error @ EngineError::Degraded { .. }) => Err(error),
            Err(error) => {
                if let Err(delete_error) = self.engine.store().delete_return(stored.id) {
                    return Err(degraded(format!(
                        "return {} could not be booked in and its record was not removed: {delete_error}",
                        stored.number
                    )));
                }
                Err(error)
            }
        }
    }

    pub fn list(&self) -> EngineResult<Vec<SalesReturn>> {
        Ok(self.engine.store().list_returns()?)
    }
}
