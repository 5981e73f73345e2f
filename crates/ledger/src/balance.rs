//! Per-SKU balance triple.

use serde::{Deserialize, Serialize};

use crate::movement::MovementKind;

/// Running balances for one SKU.
///
/// Only `physical` and `reserved` are stored; `available` is always
/// recomputed so the three can never drift apart. `physical` may go negative
/// through manual corrections (soft constraint), `reserved` may transiently
/// do so only mid-rollback of a partially applied multi-item operation.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub physical: i64,
    pub reserved: i64,
}

impl Balances {
    pub const ZERO: Balances = Balances {
        physical: 0,
        reserved: 0,
    };

    pub fn new(physical: i64, reserved: i64) -> Self {
        Self { physical, reserved }
    }

    /// Units free to promise to new orders.
    pub fn available(&self) -> i64 {
        self.physical - self.reserved
    }

    /// Apply one movement's effect and return the new balances.
    ///
    /// Pure arithmetic; precondition checking is the caller's job
    /// (see [`MovementKind::precondition`]).
    pub fn apply(&self, kind: MovementKind, quantity: i64) -> Balances {
        let effect = kind.effect();
        Balances {
            physical: self.physical + effect.physical * quantity,
            reserved: self.reserved + effect.reserved * quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_is_physical_minus_reserved() {
        let b = Balances::new(10, 4);
        assert_eq!(b.available(), 6);
        assert_eq!(Balances::ZERO.available(), 0);
    }

    #[test]
    fn dispatch_decrements_both_sides() {
        let b = Balances::new(10, 4).apply(MovementKind::StockOutDispatch, 4);
        assert_eq!(b, Balances::new(6, 0));
        assert_eq!(b.available(), 6);
    }

    #[test]
    fn reserve_only_touches_reserved() {
        let b = Balances::new(10, 0).apply(MovementKind::Reserve, 4);
        assert_eq!(b, Balances::new(10, 4));
        assert_eq!(b.available(), 6);
    }
}
