//! The stock mutation engine.
//!
//! Every balance change in the system funnels through [`StockEngine::apply`]:
//! read the SKU row, check the movement kind's precondition, append the
//! movement to the ledger, then commit the recomputed balances. Writers for
//! the same SKU are serialized on an in-process lock so a queued contender
//! re-reads fresh balances and fails its precondition rather than racing; the
//! versioned balance commit stays underneath as a second guard against
//! out-of-process writers.
//!
//! Multi-line operations are sequential. When one line fails, the already
//! applied lines are undone in reverse order with their compensating
//! movement kinds; a failure while compensating leaves the system in a
//! degraded state and is reported as such.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use atelier_core::{DomainError, ExpectedVersion, SkuId};
use atelier_ledger::{Compensation, Movement, MovementDraft};

use crate::store::{SkuRecord, StockStore, StoreError};

/// Operator metadata stamped onto every movement an operation records.
#[derive(Debug, Clone)]
pub struct MovementContext {
    pub actor: String,
    pub note: Option<String>,
    pub reference: Option<String>,
}

impl MovementContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            note: None,
            reference: None,
        }
    }

    pub fn system() -> Self {
        Self::new("system")
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

impl Default for MovementContext {
    fn default() -> Self {
        Self::system()
    }
}

/// Engine operation error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The ledger and the cached balances may disagree. Nothing is retried
    /// automatically; the state needs operator reconciliation.
    #[error("stock state degraded: {detail}")]
    Degraded { detail: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Sole writer of SKU balances and the movement ledger.
pub struct StockEngine<S> {
    store: S,
    locks: Mutex<HashMap<SkuId, Arc<Mutex<()>>>>,
}

impl<S: StockStore> StockEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Read access to the backing store for query paths.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply one movement: precondition, ledger append, balance commit.
    pub fn apply(&self, draft: &MovementDraft, ctx: &MovementContext) -> EngineResult<SkuRecord> {
        draft.validate()?;
        let lock = self.lock_for(draft.sku_id)?;
        let _guard = lock.lock().map_err(|_| EngineError::Degraded {
            detail: format!("a writer panicked while holding the lock for sku {}", draft.sku_id),
        })?;
        self.apply_locked(draft, ctx)
    }

    /// Apply a batch sequentially, all-or-nothing.
    ///
    /// On failure the applied prefix is rolled back in reverse order; the
    /// original error is returned. If the rollback itself fails the system
    /// is degraded and that takes precedence.
    pub fn apply_all(
        &self,
        drafts: &[MovementDraft],
        ctx: &MovementContext,
    ) -> EngineResult<Vec<SkuRecord>> {
        let mut records = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.iter().enumerate() {
            match self.apply(draft, ctx) {
                Ok(record) => records.push(record),
                Err(error) => {
                    self.roll_back(&drafts[..index], ctx)?;
                    return Err(error);
                }
            }
        }
        Ok(records)
    }

    /// Undo already-applied drafts in reverse order using the compensating
    /// kind of each movement.
    ///
    /// Any failure here is a degraded state: part of the batch has been
    /// undone and part has not.
    pub fn roll_back(&self, applied: &[MovementDraft], ctx: &MovementContext) -> EngineResult<()> {
        for draft in applied.iter().rev() {
            let rollback_ctx = MovementContext {
                actor: ctx.actor.clone(),
                note: Some(format!("rollback of {}", draft.kind)),
                reference: ctx.reference.clone(),
            };
            let outcome = match draft.kind.compensation() {
                Compensation::Single(kind) => self
                    .apply(&MovementDraft::new(draft.sku_id, kind, draft.quantity), &rollback_ctx)
                    .map(|_| ()),
                Compensation::Pair(first, second) => self
                    .apply(&MovementDraft::new(draft.sku_id, first, draft.quantity), &rollback_ctx)
                    .and_then(|_| {
                        self.apply(&MovementDraft::new(draft.sku_id, second, draft.quantity), &rollback_ctx)
                    })
                    .map(|_| ()),
            };
            if let Err(error) = outcome {
                warn!(
                    sku_id = %draft.sku_id,
                    kind = %draft.kind,
                    quantity = draft.quantity,
                    %error,
                    "compensation failed, stock state is degraded"
                );
                return Err(EngineError::Degraded {
                    detail: format!(
                        "compensation for {} x{} on sku {} failed: {error}",
                        draft.kind, draft.quantity, draft.sku_id
                    ),
                });
            }
        }
        Ok(())
    }

    fn apply_locked(&self, draft: &MovementDraft, ctx: &MovementContext) -> EngineResult<SkuRecord> {
        let sku = self.store.read_sku(draft.sku_id)?;
        draft.kind.precondition(&sku.balances, draft.quantity, sku.id)?;

        let mut movement = Movement::new(
            draft.sku_id,
            draft.kind,
            draft.quantity,
            Utc::now(),
            ctx.actor.clone(),
        )?;
        if let Some(note) = &ctx.note {
            movement = movement.with_note(note.clone());
        }
        if let Some(reference) = &ctx.reference {
            movement = movement.with_reference(reference.clone());
        }

        self.store.insert_movement(&movement)?;

        let next = sku.balances.apply(draft.kind, draft.quantity);
        match self
            .store
            .upsert_sku(sku.id, next, ExpectedVersion::Exact(sku.version))
        {
            Ok(updated) => {
                debug!(
                    sku_id = %updated.id,
                    kind = %draft.kind,
                    quantity = draft.quantity,
                    physical = updated.balances.physical,
                    reserved = updated.balances.reserved,
                    "movement applied"
                );
                Ok(updated)
            }
            // The ledger row exists but the balance cache was not committed.
            Err(error) => Err(EngineError::Degraded {
                detail: format!(
                    "movement {} is in the ledger but the balance commit for sku {} failed: {error}",
                    movement.id, sku.id
                ),
            }),
        }
    }

    fn lock_for(&self, sku_id: SkuId) -> EngineResult<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| EngineError::Degraded {
            detail: "a writer panicked while holding the lock registry".to_string(),
        })?;
        Ok(locks.entry(sku_id).or_default().clone())
    }
}
