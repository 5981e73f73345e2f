use std::sync::Arc;

use chrono::Utc;

use atelier_core::{CustomerId, OrderId};
use atelier_orders::{Order, OrderItem, OrderStatus, PaymentStatus};

use crate::engine::{EngineError, EngineResult, MovementContext, StockEngine};
use crate::store::StockStore;

use super::degraded;

pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItem>,
    pub note: Option<String>,
    pub actor: String,
}

/// Customer order lifecycle: creation reserves, status changes move stock.
pub struct OrderService<S> {
    engine: Arc<StockEngine<S>>,
}

impl<S: StockStore> OrderService<S> {
    pub fn new(engine: Arc<StockEngine<S>>) -> Self {
        Self { engine }
    }

    /// Create an order, reserving every line. All-or-nothing: when any line
    /// cannot be reserved the applied reservations are released and the
    /// header is removed.
    pub fn create(&self, input: NewOrder) -> EngineResult<Order> {
        let order = Order::create(input.customer_id, input.items, input.note, Utc::now())?;
        let stored = self.engine.store().insert_order(&order)?;

        let ctx = MovementContext::new(&input.actor)
            .with_note(format!("reservation for order {}", stored.number))
            .with_reference(stored.number.clone());

        match self.engine.apply_all(&stored.reservation_drafts(), &ctx) {
            Ok(_) => Ok(stored),
            // Degraded means the release compensation already failed; keep
            // the header so the operator can see what the order tried to do.
            Err(error @ EngineError::Degraded { .. }) => Err(error),
            Err(error) => {
                if let Err(delete_error) = self.engine.store().delete_order(stored.id) {
                    return Err(degraded(format!(
                        "order {} could not be reserved and its header was not removed: {delete_error}",
                        stored.number
                    )));
                }
                Err(error)
            }
        }
    }

    /// Drive a status transition, applying the movements it requires.
    pub fn set_status(&self, id: OrderId, to: OrderStatus, actor: &str) -> EngineResult<Order> {
        let mut order = self.engine.store().read_order(id)?;
        let drafts = order.transition(to)?;

        if !drafts.is_empty() {
            let ctx = MovementContext::new(actor)
                .with_note(status_note(&order, to))
                .with_reference(order.number.clone());
            self.engine.apply_all(&drafts, &ctx)?;
        }

        order.status = to;
        match self.engine.store().update_order(&order) {
            Ok(()) => Ok(order),
            Err(error) if drafts.is_empty() => Err(error.into()),
            Err(error) => Err(degraded(format!(
                "stock moved for order {} but the status change to {to:?} was not stored: {error}",
                order.number
            ))),
        }
    }

    pub fn set_payment_status(&self, id: OrderId, to: PaymentStatus) -> EngineResult<Order> {
        let mut order = self.engine.store().read_order(id)?;
        order.payment_status = to;
        self.engine.store().update_order(&order)?;
        Ok(order)
    }

    pub fn get(&self, id: OrderId) -> EngineResult<Order> {
        Ok(self.engine.store().read_order(id)?)
    }

    pub fn list(&self) -> EngineResult<Vec<Order>> {
        Ok(self.engine.store().list_orders()?)
    }
}

fn status_note(order: &Order, to: OrderStatus) -> String {
    match to {
        OrderStatus::Dispatched => format!("dispatch of order {}", order.number),
        OrderStatus::Cancelled => format!("order {} cancelled", order.number),
        OrderStatus::Picking if order.status == OrderStatus::Dispatched => {
            format!("dispatch of order {} reversed", order.number)
        }
        OrderStatus::Open => format!("order {} reopened", order.number),
        _ => format!("order {} status change", order.number),
    }
}
