//! Movement kinds, the effect table, and the immutable movement record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{DomainError, DomainResult, MovementId, SkuId};

use crate::balance::Balances;

/// The nine movement kinds. Quantity is always carried as a positive
/// magnitude; the kind decides the sign on each balance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    StockInPurchase,
    StockInProduction,
    StockInReturn,
    StockOutSale,
    StockOutDispatch,
    Reserve,
    ReleaseReserve,
    AdjustPositive,
    AdjustNegative,
}

/// Signed unit multipliers a kind applies to (physical, reserved).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BalanceEffect {
    pub physical: i64,
    pub reserved: i64,
}

/// How a committed movement of some kind is undone.
///
/// Dispatch is the one kind without a direct inverse: it is reconstructed as
/// a return followed by a fresh reservation. That changes the history's
/// meaning from "undo" to "return + new reservation" and is a deliberate
/// policy, not an accident. Every rollback path goes through this table so
/// the policy lives in exactly one place.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Compensation {
    Single(MovementKind),
    Pair(MovementKind, MovementKind),
}

impl MovementKind {
    pub const ALL: [MovementKind; 9] = [
        MovementKind::StockInPurchase,
        MovementKind::StockInProduction,
        MovementKind::StockInReturn,
        MovementKind::StockOutSale,
        MovementKind::StockOutDispatch,
        MovementKind::Reserve,
        MovementKind::ReleaseReserve,
        MovementKind::AdjustPositive,
        MovementKind::AdjustNegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::StockInPurchase => "stock_in_purchase",
            MovementKind::StockInProduction => "stock_in_production",
            MovementKind::StockInReturn => "stock_in_return",
            MovementKind::StockOutSale => "stock_out_sale",
            MovementKind::StockOutDispatch => "stock_out_dispatch",
            MovementKind::Reserve => "reserve",
            MovementKind::ReleaseReserve => "release_reserve",
            MovementKind::AdjustPositive => "adjust_positive",
            MovementKind::AdjustNegative => "adjust_negative",
        }
    }

    /// Effect table: what one unit of this kind does to the balances.
    pub fn effect(&self) -> BalanceEffect {
        match self {
            MovementKind::StockInPurchase
            | MovementKind::StockInProduction
            | MovementKind::StockInReturn
            | MovementKind::AdjustPositive => BalanceEffect {
                physical: 1,
                reserved: 0,
            },
            MovementKind::StockOutSale | MovementKind::AdjustNegative => BalanceEffect {
                physical: -1,
                reserved: 0,
            },
            MovementKind::StockOutDispatch => BalanceEffect {
                physical: -1,
                reserved: -1,
            },
            MovementKind::Reserve => BalanceEffect {
                physical: 0,
                reserved: 1,
            },
            MovementKind::ReleaseReserve => BalanceEffect {
                physical: 0,
                reserved: -1,
            },
        }
    }

    /// Balance precondition for applying `quantity` units of this kind.
    ///
    /// `AdjustNegative` is deliberately unchecked: it is the correction path
    /// (production reopen, cut-sync reversal, stocktake) and may drive
    /// `physical` negative. A sale is a business operation and is checked.
    pub fn precondition(
        &self,
        balances: &Balances,
        quantity: i64,
        sku_id: SkuId,
    ) -> DomainResult<()> {
        let usable = match self {
            MovementKind::StockInPurchase
            | MovementKind::StockInProduction
            | MovementKind::StockInReturn
            | MovementKind::AdjustPositive
            | MovementKind::AdjustNegative => return Ok(()),
            MovementKind::StockOutSale => balances.physical,
            MovementKind::StockOutDispatch | MovementKind::ReleaseReserve => balances.reserved,
            MovementKind::Reserve => balances.available(),
        };

        if usable >= quantity {
            Ok(())
        } else {
            Err(DomainError::insufficient_stock(sku_id, quantity, usable))
        }
    }

    /// Compensating movement(s) that undo a committed movement of this kind.
    pub fn compensation(&self) -> Compensation {
        match self {
            MovementKind::Reserve => Compensation::Single(MovementKind::ReleaseReserve),
            MovementKind::ReleaseReserve => Compensation::Single(MovementKind::Reserve),
            MovementKind::StockInPurchase
            | MovementKind::StockInProduction
            | MovementKind::StockInReturn
            | MovementKind::AdjustPositive => Compensation::Single(MovementKind::AdjustNegative),
            MovementKind::StockOutSale | MovementKind::AdjustNegative => {
                Compensation::Single(MovementKind::AdjustPositive)
            }
            MovementKind::StockOutDispatch => {
                Compensation::Pair(MovementKind::StockInReturn, MovementKind::Reserve)
            }
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MovementKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown movement kind: {s}")))
    }
}

/// A movement a lifecycle component wants applied, before the engine stamps
/// identity, time and operator metadata onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDraft {
    pub sku_id: SkuId,
    pub kind: MovementKind,
    pub quantity: i64,
}

impl MovementDraft {
    pub fn new(sku_id: SkuId, kind: MovementKind, quantity: i64) -> Self {
        Self {
            sku_id,
            kind,
            quantity,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 1 {
            return Err(DomainError::validation(format!(
                "movement quantity must be at least 1, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Immutable ledger record. Never edited or deleted; corrections are new
/// compensating movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub sku_id: SkuId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
    pub actor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Movement {
    pub fn new(
        sku_id: SkuId,
        kind: MovementKind,
        quantity: i64,
        occurred_at: DateTime<Utc>,
        actor: impl Into<String>,
    ) -> DomainResult<Self> {
        MovementDraft::new(sku_id, kind, quantity).validate()?;
        Ok(Self {
            id: MovementId::new(),
            sku_id,
            kind,
            quantity,
            occurred_at,
            actor: actor.into(),
            note: None,
            reference: None,
        })
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_sku_id() -> SkuId {
        "018f2f53-0000-7000-8000-000000000001".parse().unwrap()
    }

    #[test]
    fn stock_in_kinds_increase_physical_only() {
        for kind in [
            MovementKind::StockInPurchase,
            MovementKind::StockInProduction,
            MovementKind::StockInReturn,
            MovementKind::AdjustPositive,
        ] {
            let effect = kind.effect();
            assert_eq!((effect.physical, effect.reserved), (1, 0), "{kind}");
        }
    }

    #[test]
    fn reserve_requires_available() {
        let balances = Balances::new(5, 3);
        assert!(MovementKind::Reserve
            .precondition(&balances, 2, test_sku_id())
            .is_ok());
        match MovementKind::Reserve.precondition(&balances, 3, test_sku_id()) {
            Err(DomainError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("Expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn dispatch_requires_reserved() {
        let balances = Balances::new(10, 2);
        assert!(MovementKind::StockOutDispatch
            .precondition(&balances, 2, test_sku_id())
            .is_ok());
        assert!(MovementKind::StockOutDispatch
            .precondition(&balances, 3, test_sku_id())
            .is_err());
    }

    #[test]
    fn sale_requires_physical_but_adjust_negative_does_not() {
        let balances = Balances::new(1, 0);
        assert!(MovementKind::StockOutSale
            .precondition(&balances, 2, test_sku_id())
            .is_err());
        assert!(MovementKind::AdjustNegative
            .precondition(&balances, 2, test_sku_id())
            .is_ok());
    }

    #[test]
    fn dispatch_compensation_is_the_return_reserve_pair() {
        match MovementKind::StockOutDispatch.compensation() {
            Compensation::Pair(MovementKind::StockInReturn, MovementKind::Reserve) => {}
            other => panic!("Expected return + reserve pair, got {other:?}"),
        }
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in MovementKind::ALL {
            let parsed: MovementKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("stock_teleport".parse::<MovementKind>().is_err());
    }

    #[test]
    fn movement_rejects_non_positive_quantity() {
        match Movement::new(test_sku_id(), MovementKind::Reserve, 0, Utc::now(), "op") {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("at least 1")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    fn apply_compensation(balances: Balances, kind: MovementKind, quantity: i64) -> Balances {
        match kind.compensation() {
            Compensation::Single(inverse) => balances.apply(inverse, quantity),
            Compensation::Pair(first, second) => {
                balances.apply(first, quantity).apply(second, quantity)
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Applying any kind and then its compensation restores the balances.
        #[test]
        fn compensation_is_an_inverse(
            physical in -1_000i64..1_000,
            reserved in -1_000i64..1_000,
            kind_index in 0usize..MovementKind::ALL.len(),
            quantity in 1i64..500,
        ) {
            let start = Balances::new(physical, reserved);
            let kind = MovementKind::ALL[kind_index];
            let moved = start.apply(kind, quantity);
            let restored = apply_compensation(moved, kind, quantity);
            prop_assert_eq!(restored, start);
        }

        /// The available balance is always the recomputed difference.
        #[test]
        fn available_tracks_physical_minus_reserved(
            physical in -1_000i64..1_000,
            reserved in -1_000i64..1_000,
            kind_index in 0usize..MovementKind::ALL.len(),
            quantity in 1i64..500,
        ) {
            let next = Balances::new(physical, reserved)
                .apply(MovementKind::ALL[kind_index], quantity);
            prop_assert_eq!(next.available(), next.physical - next.reserved);
        }
    }
}
