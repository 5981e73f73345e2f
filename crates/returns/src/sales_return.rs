use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{DomainError, DomainResult, OrderId, ReturnId, SkuId};
use atelier_ledger::{MovementDraft, MovementKind};
use atelier_orders::{Order, OrderStatus};

/// Returned line: SKU and quantity coming back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub sku_id: SkuId,
    pub quantity: i64,
}

/// A recorded return against a dispatched order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReturn {
    pub id: ReturnId,
    /// Human-facing document number, assigned by the store at insert.
    pub number: String,
    pub order_id: OrderId,
    pub items: Vec<ReturnItem>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl SalesReturn {
    /// Validate a return against the order it claims to come from.
    ///
    /// The order must be dispatched, every returned SKU must be on the
    /// order, and per SKU the returned total must not exceed what that order
    /// dispatched. The check is per return operation; cumulative caps across
    /// several returns for the same order are not enforced.
    pub fn for_order(
        order: &Order,
        items: Vec<ReturnItem>,
        reason: impl Into<String>,
        note: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if order.status != OrderStatus::Dispatched {
            return Err(DomainError::validation(format!(
                "order {} is {:?}; returns are only accepted against dispatched orders",
                order.id, order.status
            )));
        }
        if items.is_empty() {
            return Err(DomainError::validation("return must have at least one item"));
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("return reason must not be empty"));
        }

        let mut returned_by_sku: HashMap<SkuId, i64> = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            if item.quantity < 1 {
                return Err(DomainError::validation(format!(
                    "return item {index} quantity must be at least 1, got {}",
                    item.quantity
                )));
            }
            *returned_by_sku.entry(item.sku_id).or_default() += item.quantity;
        }

        for (sku_id, returned) in &returned_by_sku {
            let dispatched = order.quantity_of(*sku_id);
            if dispatched == 0 {
                return Err(DomainError::validation(format!(
                    "sku {sku_id} is not on order {}",
                    order.id
                )));
            }
            if *returned > dispatched {
                return Err(DomainError::validation(format!(
                    "return of {returned} exceeds the {dispatched} dispatched for sku {sku_id} on order {}",
                    order.id
                )));
            }
        }

        Ok(Self {
            id: ReturnId::new(),
            number: String::new(),
            order_id: order.id,
            items,
            reason,
            note,
            recorded_at,
        })
    }

    /// Stock-in movements for the returned goods. Never re-reserves.
    pub fn drafts(&self) -> Vec<MovementDraft> {
        self.items
            .iter()
            .map(|item| MovementDraft::new(item.sku_id, MovementKind::StockInReturn, item.quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::CustomerId;
    use atelier_orders::OrderItem;

    fn test_sku_id(n: u8) -> SkuId {
        format!("018f2f53-0000-7000-8000-0000000000{n:02x}")
            .parse()
            .unwrap()
    }

    fn dispatched_order() -> Order {
        let customer: CustomerId = "018f2f53-0000-7000-8000-0000000000aa".parse().unwrap();
        let mut order = Order::create(
            customer,
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
        .unwrap();
        order.status = OrderStatus::Dispatched;
        order
    }

    #[test]
    fn accepts_partial_return_and_emits_stock_in() {
        let order = dispatched_order();
        let ret = SalesReturn::for_order(
            &order,
            vec![ReturnItem {
                sku_id: test_sku_id(1),
                quantity: 1,
            }],
            "wrong size",
            None,
            Utc::now(),
        )
        .unwrap();

        let drafts = ret.drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, MovementKind::StockInReturn);
        assert_eq!(drafts[0].quantity, 1);
    }

    #[test]
    fn rejects_non_dispatched_orders() {
        let mut order = dispatched_order();
        order.status = OrderStatus::Picking;
        let result = SalesReturn::for_order(
            &order,
            vec![ReturnItem {
                sku_id: test_sku_id(1),
                quantity: 1,
            }],
            "damaged",
            None,
            Utc::now(),
        );
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("dispatched")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_skus_not_on_the_order() {
        let order = dispatched_order();
        let result = SalesReturn::for_order(
            &order,
            vec![ReturnItem {
                sku_id: test_sku_id(9),
                quantity: 1,
            }],
            "damaged",
            None,
            Utc::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_over_dispatch_totals_across_duplicate_lines() {
        let order = dispatched_order();
        let result = SalesReturn::for_order(
            &order,
            vec![
                ReturnItem {
                    sku_id: test_sku_id(1),
                    quantity: 3,
                },
                ReturnItem {
                    sku_id: test_sku_id(1),
                    quantity: 2,
                },
            ],
            "damaged",
            None,
            Utc::now(),
        );
        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("exceeds")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_reason() {
        let order = dispatched_order();
        let result = SalesReturn::for_order(
            &order,
            vec![ReturnItem {
                sku_id: test_sku_id(1),
                quantity: 1,
            }],
            "  ",
            None,
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
