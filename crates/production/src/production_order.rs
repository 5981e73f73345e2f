use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{DomainError, DomainResult, ProductionOrderId, SkuId};
use atelier_ledger::{MovementDraft, MovementKind};

/// Production stages, advanced strictly in order. `Cancelled` is reachable
/// from any non-terminal stage. `Completed` and `Cancelled` are terminal,
/// except for the reopen path out of `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionStatus {
    Planned,
    Cutting,
    Sewing,
    Finishing,
    Completed,
    Cancelled,
}

impl ProductionStatus {
    /// Next stage on the linear ladder, `None` past the end.
    pub fn next(&self) -> Option<ProductionStatus> {
        use ProductionStatus::*;
        match self {
            Planned => Some(Cutting),
            Cutting => Some(Sewing),
            Sewing => Some(Finishing),
            Finishing => Some(Completed),
            Completed | Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProductionStatus::Completed | ProductionStatus::Cancelled)
    }
}

/// Internal production order for a single SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: ProductionOrderId,
    /// Human-facing document number, assigned by the store at insert.
    pub number: String,
    pub sku_id: SkuId,
    pub quantity: i64,
    pub status: ProductionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProductionOrder {
    pub fn create(
        sku_id: SkuId,
        quantity: i64,
        assignee: Option<String>,
        note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 1 {
            return Err(DomainError::validation(format!(
                "production quantity must be at least 1, got {quantity}"
            )));
        }

        Ok(Self {
            id: ProductionOrderId::new(),
            number: String::new(),
            sku_id,
            quantity,
            status: ProductionStatus::Planned,
            created_at,
            started_at: None,
            finished_at: None,
            assignee,
            note,
        })
    }

    /// Stage the next advance would land on.
    pub fn advance_target(&self) -> DomainResult<ProductionStatus> {
        self.status.next().ok_or_else(|| {
            DomainError::validation(format!(
                "production order {} is {:?} and cannot advance",
                self.id, self.status
            ))
        })
    }

    /// Movements required when entering `to`. Only completion moves stock.
    pub fn entry_drafts(&self, to: ProductionStatus) -> Vec<MovementDraft> {
        if to == ProductionStatus::Completed {
            vec![MovementDraft::new(
                self.sku_id,
                MovementKind::StockInProduction,
                self.quantity,
            )]
        } else {
            Vec::new()
        }
    }

    /// Validate cancellation. Cancelling never moves stock: a cancelled
    /// order never completed, so there is nothing to take back.
    pub fn cancel_check(&self) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "production order {} is {:?} and cannot be cancelled",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Movements required to reopen a completed order back to `to`.
    ///
    /// The compensating decrease is an adjustment, not a reversed
    /// production entry: once produced units are in physical stock they are
    /// indistinguishable from any other unit, so only physical comes down.
    pub fn reopen_drafts(&self, to: ProductionStatus) -> DomainResult<Vec<MovementDraft>> {
        if self.status != ProductionStatus::Completed {
            return Err(DomainError::validation(format!(
                "production order {} is {:?}; only completed orders reopen",
                self.id, self.status
            )));
        }
        if to.is_terminal() {
            return Err(DomainError::validation(format!(
                "production order {} cannot reopen into terminal stage {to:?}",
                self.id
            )));
        }

        Ok(vec![MovementDraft::new(
            self.sku_id,
            MovementKind::AdjustNegative,
            self.quantity,
        )])
    }

    /// Record a stage change, keeping the start/finish timestamps straight.
    pub fn apply_status(&mut self, to: ProductionStatus, now: DateTime<Utc>) {
        if self.status == ProductionStatus::Planned
            && to != ProductionStatus::Planned
            && to != ProductionStatus::Cancelled
            && self.started_at.is_none()
        {
            self.started_at = Some(now);
        }
        match to {
            ProductionStatus::Completed => self.finished_at = Some(now),
            _ => {
                if self.status == ProductionStatus::Completed {
                    self.finished_at = None;
                }
            }
        }
        self.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sku_id() -> SkuId {
        "018f2f53-0000-7000-8000-000000000003".parse().unwrap()
    }

    fn planned_order(quantity: i64) -> ProductionOrder {
        ProductionOrder::create(test_sku_id(), quantity, None, None, Utc::now()).unwrap()
    }

    #[test]
    fn create_rejects_non_positive_quantity() {
        match ProductionOrder::create(test_sku_id(), 0, None, None, Utc::now()) {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("at least 1")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn ladder_advances_in_order_and_stops() {
        let mut order = planned_order(20);
        let expected = [
            ProductionStatus::Cutting,
            ProductionStatus::Sewing,
            ProductionStatus::Finishing,
            ProductionStatus::Completed,
        ];
        for stage in expected {
            let target = order.advance_target().unwrap();
            assert_eq!(target, stage);
            order.apply_status(target, Utc::now());
        }
        assert!(order.advance_target().is_err());
    }

    #[test]
    fn only_completion_moves_stock() {
        let order = planned_order(20);
        assert!(order.entry_drafts(ProductionStatus::Cutting).is_empty());
        assert!(order.entry_drafts(ProductionStatus::Finishing).is_empty());

        let drafts = order.entry_drafts(ProductionStatus::Completed);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, MovementKind::StockInProduction);
        assert_eq!(drafts[0].quantity, 20);
    }

    #[test]
    fn timestamps_follow_the_lifecycle() {
        let mut order = planned_order(5);
        assert!(order.started_at.is_none());

        order.apply_status(ProductionStatus::Cutting, Utc::now());
        assert!(order.started_at.is_some());
        assert!(order.finished_at.is_none());

        order.apply_status(ProductionStatus::Sewing, Utc::now());
        order.apply_status(ProductionStatus::Finishing, Utc::now());
        order.apply_status(ProductionStatus::Completed, Utc::now());
        assert!(order.finished_at.is_some());

        order.apply_status(ProductionStatus::Finishing, Utc::now());
        assert!(order.finished_at.is_none());
    }

    #[test]
    fn cancel_only_from_non_terminal() {
        let mut order = planned_order(5);
        assert!(order.cancel_check().is_ok());

        order.apply_status(ProductionStatus::Completed, Utc::now());
        assert!(order.cancel_check().is_err());

        let mut cancelled = planned_order(5);
        cancelled.apply_status(ProductionStatus::Cancelled, Utc::now());
        assert!(cancelled.cancel_check().is_err());
    }

    #[test]
    fn reopen_emits_one_adjust_negative() {
        let mut order = planned_order(20);
        order.apply_status(ProductionStatus::Completed, Utc::now());

        let drafts = order.reopen_drafts(ProductionStatus::Sewing).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].kind, MovementKind::AdjustNegative);
        assert_eq!(drafts[0].quantity, 20);

        assert!(order.reopen_drafts(ProductionStatus::Cancelled).is_err());

        let planned = planned_order(20);
        assert!(planned.reopen_drafts(ProductionStatus::Planned).is_err());
    }
}
