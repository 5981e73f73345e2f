//! Rebuild balances from a movement history.
//!
//! The cached balances are conceptually a running total over the ledger.
//! Replay folds a history back into that total, which is what the audit
//! check compares against the stored row. Replay applies effects without
//! precondition checks: history may legitimately contain soft-constraint
//! violations (negative physical after corrections).

use atelier_core::SkuId;

use crate::balance::Balances;
use crate::movement::Movement;

/// Fold a full history (single SKU) into balances, oldest first.
pub fn replay(movements: &[Movement]) -> Balances {
    movements
        .iter()
        .fold(Balances::ZERO, |balances, movement| {
            balances.apply(movement.kind, movement.quantity)
        })
}

/// Fold only the movements belonging to `sku_id`.
pub fn replay_for(sku_id: SkuId, movements: &[Movement]) -> Balances {
    movements
        .iter()
        .filter(|movement| movement.sku_id == sku_id)
        .fold(Balances::ZERO, |balances, movement| {
            balances.apply(movement.kind, movement.quantity)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementKind;
    use chrono::Utc;

    fn test_sku_id() -> SkuId {
        "018f2f53-0000-7000-8000-000000000002".parse().unwrap()
    }

    fn movement(sku_id: SkuId, kind: MovementKind, quantity: i64) -> Movement {
        Movement::new(sku_id, kind, quantity, Utc::now(), "test").unwrap()
    }

    #[test]
    fn replays_an_order_lifecycle() {
        let sku = test_sku_id();
        let history = vec![
            movement(sku, MovementKind::StockInPurchase, 10),
            movement(sku, MovementKind::Reserve, 4),
            movement(sku, MovementKind::StockOutDispatch, 4),
            movement(sku, MovementKind::StockInReturn, 1),
        ];

        let balances = replay(&history);
        assert_eq!(balances, Balances::new(7, 0));
        assert_eq!(balances.available(), 7);
    }

    #[test]
    fn replay_for_ignores_other_skus() {
        let sku = test_sku_id();
        let other: SkuId = "018f2f53-0000-7000-8000-00000000000f".parse().unwrap();
        let history = vec![
            movement(sku, MovementKind::StockInPurchase, 5),
            movement(other, MovementKind::StockInPurchase, 99),
        ];

        assert_eq!(replay_for(sku, &history), Balances::new(5, 0));
    }

    #[test]
    fn replay_tolerates_negative_physical() {
        let sku = test_sku_id();
        let history = vec![
            movement(sku, MovementKind::StockInProduction, 20),
            movement(sku, MovementKind::StockOutSale, 15),
            movement(sku, MovementKind::AdjustNegative, 20),
        ];

        assert_eq!(replay(&history), Balances::new(-15, 0));
    }
}
