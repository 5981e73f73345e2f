use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use atelier_core::{CutBatchId, SkuId, VariantKey};
use atelier_cutwork::{CutBatch, good_unit_allocations};
use atelier_ledger::{MovementDraft, MovementKind};

use crate::engine::{EngineResult, MovementContext, StockEngine};
use crate::store::StockStore;

/// One ledger line a sync (or revert) produced.
#[derive(Debug, Clone, Serialize)]
pub struct CutSyncLine {
    pub sku_id: SkuId,
    pub key: VariantKey,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CutSyncReport {
    pub batch_id: CutBatchId,
    pub reference: String,
    pub good_units: i64,
    pub lines: Vec<CutSyncLine>,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Reconciles received cut batches into the ledger.
///
/// The batch records are owned by the cutting workflow; this side only reads
/// them, applies the proportional good-unit breakdown as production intake
/// and maintains the sync marker. Reverting recomputes the same breakdown
/// and withdraws it, so sync and revert are exact inverses as long as the
/// batch rows are untouched in between.
pub struct CutSyncService<S> {
    engine: Arc<StockEngine<S>>,
}

impl<S: StockStore> CutSyncService<S> {
    pub fn new(engine: Arc<StockEngine<S>>) -> Self {
        Self { engine }
    }

    /// Book the batch's good units into stock and set the sync marker.
    ///
    /// An all-defective batch books nothing but still gets the marker: it
    /// has been processed, and a second sync must be rejected either way.
    pub fn sync(&self, id: CutBatchId, actor: &str) -> EngineResult<CutSyncReport> {
        let batch = self.engine.store().read_cut_batch(id)?;
        batch.sync_guard()?;

        let (drafts, lines) = self.resolve_lines(&batch)?;
        let ctx = MovementContext::new(actor)
            .with_note(format!("cut batch {} received from workshop", batch.reference))
            .with_reference(batch.reference.clone());
        self.engine.apply_all(&drafts, &ctx)?;

        let synced_at = Utc::now();
        if let Err(error) = self
            .engine
            .store()
            .write_cut_batch_sync_marker(id, Some(synced_at))
        {
            // Without the marker a retry would book everything twice; take
            // the movements back out before reporting the failure.
            self.engine.roll_back(&drafts, &ctx)?;
            return Err(error.into());
        }

        let good_units = lines.iter().map(|line| line.quantity).sum();
        info!(
            batch = %batch.reference,
            good_units,
            line_count = lines.len(),
            "cut batch synced"
        );

        Ok(CutSyncReport {
            batch_id: id,
            reference: batch.reference,
            good_units,
            lines,
            synced_at: Some(synced_at),
        })
    }

    /// Withdraw what the sync booked in and clear the marker.
    pub fn revert(&self, id: CutBatchId, actor: &str) -> EngineResult<CutSyncReport> {
        let batch = self.engine.store().read_cut_batch(id)?;
        batch.revert_guard()?;

        let (mut drafts, lines) = self.resolve_lines(&batch)?;
        for draft in &mut drafts {
            draft.kind = MovementKind::AdjustNegative;
        }

        let ctx = MovementContext::new(actor)
            .with_note(format!("receipt of cut batch {} reverted", batch.reference))
            .with_reference(batch.reference.clone());
        self.engine.apply_all(&drafts, &ctx)?;

        if let Err(error) = self.engine.store().write_cut_batch_sync_marker(id, None) {
            self.engine.roll_back(&drafts, &ctx)?;
            return Err(error.into());
        }

        let good_units = lines.iter().map(|line| line.quantity).sum();
        info!(
            batch = %batch.reference,
            good_units,
            "cut batch receipt reverted"
        );

        Ok(CutSyncReport {
            batch_id: id,
            reference: batch.reference,
            good_units,
            lines,
            synced_at: None,
        })
    }

    pub fn get(&self, id: CutBatchId) -> EngineResult<CutBatch> {
        Ok(self.engine.store().read_cut_batch(id)?)
    }

    pub fn list(&self) -> EngineResult<Vec<CutBatch>> {
        Ok(self.engine.store().list_cut_batches()?)
    }

    /// Resolve the batch's good-unit breakdown to SKU rows, creating rows
    /// for variants the ledger has never seen.
    fn resolve_lines(
        &self,
        batch: &CutBatch,
    ) -> EngineResult<(Vec<MovementDraft>, Vec<CutSyncLine>)> {
        let allocations = good_unit_allocations(batch)?;
        let mut drafts = Vec::with_capacity(allocations.len());
        let mut lines = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let sku = self.engine.store().find_or_create_sku(&allocation.key)?;
            drafts.push(MovementDraft::new(
                sku.id,
                MovementKind::StockInProduction,
                allocation.quantity,
            ));
            lines.push(CutSyncLine {
                sku_id: sku.id,
                key: allocation.key,
                quantity: allocation.quantity,
            });
        }
        Ok((drafts, lines))
    }
}
