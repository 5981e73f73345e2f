use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{CustomerId, DomainError, DomainResult, OrderId, SkuId};
use atelier_ledger::{MovementDraft, MovementKind};

/// Customer order status lifecycle.
///
/// `Open → Picking → Dispatched`, with cancellation out of the two early
/// states. `Dispatched` is terminal except for the administrative reversal
/// back to `Picking`; `Cancelled` can be reopened to `Open` if stock still
/// allows re-reserving every item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Picking,
    Dispatched,
    Cancelled,
}

/// Payment status carried for the back office; has no stock effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Partial,
}

/// Order line: SKU and quantity. The same SKU may appear on several lines;
/// reservations are per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub sku_id: SkuId,
    pub quantity: i64,
}

/// Customer order. All items are reserved at creation, all-or-nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing document number, assigned by the store at insert.
    pub number: String,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Build a new order in `Open` state. The caller still has to reserve
    /// every item through the engine before the order is real.
    pub fn create(
        customer_id: CustomerId,
        items: Vec<OrderItem>,
        note: Option<String>,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("order must have at least one item"));
        }
        for (index, item) in items.iter().enumerate() {
            if item.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "order item {index} quantity must be at least 1, got {}",
                    item.quantity
                )));
            }
        }

        Ok(Self {
            id: OrderId::new(),
            number: String::new(),
            customer_id,
            placed_at,
            status: OrderStatus::Open,
            payment_status: PaymentStatus::Pending,
            note,
            items,
        })
    }

    /// Movements that back the initial all-or-nothing reservation.
    pub fn reservation_drafts(&self) -> Vec<MovementDraft> {
        self.drafts_of(MovementKind::Reserve)
    }

    /// Validate a status change and return the movements it requires,
    /// in the order they must be applied.
    pub fn transition(&self, to: OrderStatus) -> DomainResult<Vec<MovementDraft>> {
        use OrderStatus::*;

        let drafts = match (self.status, to) {
            (Open, Picking) => Vec::new(),
            (Picking, Dispatched) => self.drafts_of(MovementKind::StockOutDispatch),
            (Open, Cancelled) | (Picking, Cancelled) => {
                self.drafts_of(MovementKind::ReleaseReserve)
            }
            // Administrative reversal of an accidental dispatch. Dispatch has
            // no direct inverse kind; the pair below reconstructs it.
            (Dispatched, Picking) => self
                .items
                .iter()
                .flat_map(|item| {
                    [
                        MovementDraft::new(item.sku_id, MovementKind::StockInReturn, item.quantity),
                        MovementDraft::new(item.sku_id, MovementKind::Reserve, item.quantity),
                    ]
                })
                .collect(),
            // Reopening may fail per item if stock was consumed meanwhile;
            // the engine reports that instead of ignoring it.
            (Cancelled, Open) => self.drafts_of(MovementKind::Reserve),
            (from, to) => {
                return Err(DomainError::validation(format!(
                    "order {} cannot move from {from:?} to {to:?}",
                    self.id
                )));
            }
        };

        Ok(drafts)
    }

    /// Quantity of one SKU across all lines (lines may repeat a SKU).
    pub fn quantity_of(&self, sku_id: SkuId) -> i64 {
        self.items
            .iter()
            .filter(|item| item.sku_id == sku_id)
            .map(|item| item.quantity)
            .sum()
    }

    fn drafts_of(&self, kind: MovementKind) -> Vec<MovementDraft> {
        self.items
            .iter()
            .map(|item| MovementDraft::new(item.sku_id, kind, item.quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sku_id(n: u8) -> SkuId {
        format!("018f2f53-0000-7000-8000-0000000000{n:02x}")
            .parse()
            .unwrap()
    }

    fn test_customer_id() -> CustomerId {
        "018f2f53-0000-7000-8000-0000000000aa".parse().unwrap()
    }

    fn two_line_order() -> Order {
        Order::create(
            test_customer_id(),
            vec![
                OrderItem {
                    sku_id: test_sku_id(1),
                    quantity: 4,
                },
                OrderItem {
                    sku_id: test_sku_id(2),
                    quantity: 2,
                },
            ],
            None,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_empty_and_non_positive_items() {
        match Order::create(test_customer_id(), vec![], None, Utc::now()) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("at least one item")),
            other => panic!("Expected Validation, got {other:?}"),
        }

        let bad = vec![OrderItem {
            sku_id: test_sku_id(1),
            quantity: 0,
        }];
        assert!(Order::create(test_customer_id(), bad, None, Utc::now()).is_err());
    }

    #[test]
    fn creation_reserves_every_line() {
        let order = two_line_order();
        let drafts = order.reservation_drafts();
        assert_eq!(drafts.len(), 2);
        assert!(drafts
            .iter()
            .all(|draft| draft.kind == MovementKind::Reserve));
        assert_eq!(drafts[0].quantity, 4);
        assert_eq!(drafts[1].quantity, 2);
    }

    #[test]
    fn picking_transition_needs_no_movements() {
        let order = two_line_order();
        assert!(order.transition(OrderStatus::Picking).unwrap().is_empty());
    }

    #[test]
    fn dispatch_only_from_picking() {
        let mut order = two_line_order();
        assert!(order.transition(OrderStatus::Dispatched).is_err());

        order.status = OrderStatus::Picking;
        let drafts = order.transition(OrderStatus::Dispatched).unwrap();
        assert_eq!(drafts.len(), 2);
        assert!(drafts
            .iter()
            .all(|draft| draft.kind == MovementKind::StockOutDispatch));
    }

    #[test]
    fn dispatch_reversal_emits_return_then_reserve_per_line() {
        let mut order = two_line_order();
        order.status = OrderStatus::Dispatched;

        let drafts = order.transition(OrderStatus::Picking).unwrap();
        assert_eq!(drafts.len(), 4);
        assert_eq!(drafts[0].kind, MovementKind::StockInReturn);
        assert_eq!(drafts[1].kind, MovementKind::Reserve);
        assert_eq!(drafts[0].sku_id, drafts[1].sku_id);
        assert_eq!(drafts[2].kind, MovementKind::StockInReturn);
        assert_eq!(drafts[3].kind, MovementKind::Reserve);
    }

    #[test]
    fn cancel_releases_and_reopen_re_reserves() {
        let mut order = two_line_order();
        let released = order.transition(OrderStatus::Cancelled).unwrap();
        assert!(released
            .iter()
            .all(|draft| draft.kind == MovementKind::ReleaseReserve));

        order.status = OrderStatus::Cancelled;
        let reopened = order.transition(OrderStatus::Open).unwrap();
        assert!(reopened
            .iter()
            .all(|draft| draft.kind == MovementKind::Reserve));
    }

    #[test]
    fn terminal_states_reject_other_moves() {
        let mut order = two_line_order();
        order.status = OrderStatus::Dispatched;
        assert!(order.transition(OrderStatus::Cancelled).is_err());
        assert!(order.transition(OrderStatus::Open).is_err());

        order.status = OrderStatus::Cancelled;
        assert!(order.transition(OrderStatus::Dispatched).is_err());
    }

    #[test]
    fn quantity_of_sums_repeated_lines() {
        let mut order = two_line_order();
        order.items.push(OrderItem {
            sku_id: test_sku_id(1),
            quantity: 3,
        });
        assert_eq!(order.quantity_of(test_sku_id(1)), 7);
        assert_eq!(order.quantity_of(test_sku_id(2)), 2);
        assert_eq!(order.quantity_of(test_sku_id(9)), 0);
    }
}
