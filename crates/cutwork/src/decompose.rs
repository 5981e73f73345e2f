//! Proportional good-unit decomposition of a received batch.
//!
//! A workshop reports one defect total for the whole batch, not per size.
//! The sync spreads the good units over the received size breakdown in
//! proportion, flooring each share and handing out the remainder one unit at
//! a time from the first entry. Deterministic for a given batch, so the
//! reversal can recompute exactly what the sync applied.

use atelier_core::{DomainError, DomainResult, VariantKey};

use crate::cut_batch::CutBatch;

/// One slice of the decomposition: a variant and the good units it gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub key: VariantKey,
    pub quantity: i64,
}

/// Decompose `total_received − total_defects` good units over the batch's
/// received grades.
///
/// Returns an empty plan when nothing good came back (the sync is then a
/// marker-only no-op). Entries with a zero floor share stay in the plan so
/// the remainder rotation can reach them; zero-quantity allocations are
/// dropped at the end.
pub fn good_unit_allocations(batch: &CutBatch) -> DomainResult<Vec<Allocation>> {
    if batch.total_received < 0 || batch.total_defects < 0 {
        return Err(DomainError::validation(format!(
            "cut batch {} has negative totals (received {}, defects {})",
            batch.reference, batch.total_received, batch.total_defects
        )));
    }

    let received = batch.total_received;
    let good = received - batch.total_defects;
    if good <= 0 {
        return Ok(Vec::new());
    }

    let mut allocations = Vec::new();
    let mut distributed = 0i64;
    for item in &batch.items {
        let Some(received_grade) = &item.received else {
            continue;
        };
        for entry in received_grade {
            if entry.quantity <= 0 {
                continue;
            }
            let key = VariantKey::new(&batch.reference, &item.color, &entry.size)?;
            let share = entry.quantity * good / received;
            distributed += share;
            allocations.push(Allocation {
                key,
                quantity: share,
            });
        }
    }

    let mut remainder = good - distributed;
    if remainder > 0 {
        if allocations.is_empty() {
            return Err(DomainError::invariant(format!(
                "cut batch {} reports {good} good units but no received size breakdown to put them on",
                batch.reference
            )));
        }
        let len = allocations.len();
        let mut index = 0usize;
        while remainder > 0 {
            allocations[index % len].quantity += 1;
            remainder -= 1;
            index += 1;
        }
    }

    allocations.retain(|allocation| allocation.quantity > 0);
    Ok(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut_batch::{CutItem, CutStatus, GradeEntry};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn batch_with(
        items: Vec<CutItem>,
        total_received: i64,
        total_defects: i64,
    ) -> CutBatch {
        CutBatch {
            id: "018f2f53-0000-7000-8000-0000000000c2".parse().unwrap(),
            reference: "VT-020".to_string(),
            workshop: None,
            status: CutStatus::Received,
            items,
            total_sent: total_received,
            total_received,
            total_defects,
            defects_by_type: BTreeMap::new(),
            created_at: Utc::now(),
            synced_at: None,
        }
    }

    fn item(color: &str, sizes: &[(&str, i64)]) -> CutItem {
        CutItem {
            color: color.to_string(),
            planned: Vec::new(),
            received: Some(
                sizes
                    .iter()
                    .map(|(size, quantity)| GradeEntry {
                        size: size.to_string(),
                        quantity: *quantity,
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn exact_proportion_needs_no_remainder() {
        let batch = batch_with(
            vec![item("preto", &[("P", 30), ("M", 40)]), item("branco", &[("G", 30)])],
            100,
            10,
        );

        let plan = good_unit_allocations(&batch).unwrap();
        let quantities: Vec<i64> = plan.iter().map(|a| a.quantity).collect();
        assert_eq!(quantities, vec![27, 36, 27]);
        assert_eq!(plan.iter().map(|a| a.quantity).sum::<i64>(), 90);
    }

    #[test]
    fn remainder_rotates_from_the_first_entry() {
        let batch = batch_with(vec![item("azul", &[("P", 3), ("M", 3), ("G", 4)])], 10, 1);

        let plan = good_unit_allocations(&batch).unwrap();
        let quantities: Vec<i64> = plan.iter().map(|a| a.quantity).collect();
        // floors 2,2,3 then two leftover units go to the first two entries
        assert_eq!(quantities, vec![3, 3, 3]);
    }

    #[test]
    fn all_defective_batch_yields_empty_plan() {
        let batch = batch_with(vec![item("preto", &[("M", 20)])], 20, 20);
        assert!(good_unit_allocations(&batch).unwrap().is_empty());

        let worse = batch_with(vec![item("preto", &[("M", 20)])], 20, 25);
        assert!(good_unit_allocations(&worse).unwrap().is_empty());
    }

    #[test]
    fn good_units_without_breakdown_are_an_invariant_violation() {
        let batch = batch_with(vec![], 10, 2);
        match good_unit_allocations(&batch) {
            Err(DomainError::InvariantViolation(msg)) => assert!(msg.contains("no received size breakdown")),
            other => panic!("Expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn items_without_received_grade_contribute_nothing() {
        let mut pending = item("preto", &[("M", 10)]);
        pending.received = None;
        let batch = batch_with(vec![pending, item("branco", &[("M", 10)])], 10, 0);

        let plan = good_unit_allocations(&batch).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].key.color(), "branco");
        assert_eq!(plan[0].quantity, 10);
    }

    #[test]
    fn zero_grade_entries_are_skipped() {
        let batch = batch_with(vec![item("preto", &[("P", 0), ("M", 10)])], 10, 0);
        let plan = good_unit_allocations(&batch).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].key.size(), "M");
    }

    #[test]
    fn negative_totals_are_rejected() {
        let batch = batch_with(vec![item("preto", &[("M", 10)])], -1, 0);
        assert!(good_unit_allocations(&batch).is_err());
    }

    fn consistent_batch_strategy() -> impl Strategy<Value = CutBatch> {
        proptest::collection::vec(1i64..60, 1..8)
            .prop_flat_map(|quantities| {
                let total: i64 = quantities.iter().sum();
                (Just(quantities), 0..=total)
            })
            .prop_map(|(quantities, defects)| {
                let half = quantities.len() / 2;
                let (first, second) = quantities.split_at(half);
                let mut items = Vec::new();
                if !first.is_empty() {
                    let sizes: Vec<(String, i64)> = first
                        .iter()
                        .enumerate()
                        .map(|(i, q)| (format!("S{i}"), *q))
                        .collect();
                    items.push(CutItem {
                        color: "preto".to_string(),
                        planned: Vec::new(),
                        received: Some(
                            sizes
                                .into_iter()
                                .map(|(size, quantity)| GradeEntry { size, quantity })
                                .collect(),
                        ),
                    });
                }
                let sizes: Vec<(String, i64)> = second
                    .iter()
                    .enumerate()
                    .map(|(i, q)| (format!("T{i}"), *q))
                    .collect();
                items.push(CutItem {
                    color: "branco".to_string(),
                    planned: Vec::new(),
                    received: Some(
                        sizes
                            .into_iter()
                            .map(|(size, quantity)| GradeEntry { size, quantity })
                            .collect(),
                    ),
                });
                let total: i64 = quantities.iter().sum();
                batch_with(items, total, defects)
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Every good unit lands somewhere, none are invented.
        #[test]
        fn allocations_sum_to_good_units(batch in consistent_batch_strategy()) {
            let good = batch.total_received - batch.total_defects;
            let plan = good_unit_allocations(&batch).unwrap();
            let allocated: i64 = plan.iter().map(|a| a.quantity).sum();
            prop_assert_eq!(allocated, good.max(0));
            prop_assert!(plan.iter().all(|a| a.quantity > 0));
        }

        /// Same batch, same plan: the reversal relies on this.
        #[test]
        fn decomposition_is_deterministic(batch in consistent_batch_strategy()) {
            let first = good_unit_allocations(&batch).unwrap();
            let second = good_unit_allocations(&batch).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
