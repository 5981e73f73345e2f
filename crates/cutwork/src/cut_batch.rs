use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use atelier_core::{CutBatchId, DomainError, DomainResult};

/// Where a batch sits in the external workshop workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutStatus {
    Pending,
    Sent,
    Received,
}

/// Quantity per size inside one color of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeEntry {
    pub size: String,
    pub quantity: i64,
}

/// One color of a batch: the grade that was sent out and, once the batch
/// comes back, the grade that was actually received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutItem {
    pub color: String,
    pub planned: Vec<GradeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<Vec<GradeEntry>>,
}

/// A cut-of-fabric batch as recorded by the faction-management workflow.
///
/// Consumed read-only here except for `synced_at`, the one field the
/// reconciliation owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutBatch {
    pub id: CutBatchId,
    /// Product reference the batch was cut for; becomes the variant
    /// reference of every SKU the sync touches.
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workshop: Option<String>,
    pub status: CutStatus,
    pub items: Vec<CutItem>,
    pub total_sent: i64,
    pub total_received: i64,
    pub total_defects: i64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defects_by_type: BTreeMap<String, i64>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl CutBatch {
    /// Gate for the one-shot sync: never synced before, and actually received.
    pub fn sync_guard(&self) -> DomainResult<()> {
        if let Some(synced_at) = self.synced_at {
            return Err(DomainError::conflict(format!(
                "cut batch {} already synced at {synced_at}",
                self.reference
            )));
        }
        if self.status != CutStatus::Received {
            return Err(DomainError::validation(format!(
                "cut batch {} is {:?}; only received batches sync",
                self.reference, self.status
            )));
        }
        Ok(())
    }

    /// Gate for the reversal: there must be a sync to undo.
    pub fn revert_guard(&self) -> DomainResult<()> {
        if self.synced_at.is_none() {
            return Err(DomainError::conflict(format!(
                "cut batch {} has not been synced; nothing to revert",
                self.reference
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn received_batch() -> CutBatch {
        CutBatch {
            id: "018f2f53-0000-7000-8000-0000000000c1".parse().unwrap(),
            reference: "VT-010".to_string(),
            workshop: Some("Oficina Central".to_string()),
            status: CutStatus::Received,
            items: vec![CutItem {
                color: "preto".to_string(),
                planned: vec![GradeEntry {
                    size: "M".to_string(),
                    quantity: 50,
                }],
                received: Some(vec![GradeEntry {
                    size: "M".to_string(),
                    quantity: 48,
                }]),
            }],
            total_sent: 50,
            total_received: 48,
            total_defects: 3,
            defects_by_type: BTreeMap::new(),
            created_at: Utc::now(),
            synced_at: None,
        }
    }

    #[test]
    fn sync_guard_accepts_fresh_received_batch() {
        assert!(received_batch().sync_guard().is_ok());
    }

    #[test]
    fn sync_guard_rejects_already_synced() {
        let mut batch = received_batch();
        batch.synced_at = Some(Utc::now());
        match batch.sync_guard() {
            Err(DomainError::Conflict(msg)) => assert!(msg.contains("already synced")),
            other => panic!("Expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn sync_guard_rejects_unreceived_status() {
        let mut batch = received_batch();
        batch.status = CutStatus::Sent;
        assert!(batch.sync_guard().is_err());
    }

    #[test]
    fn revert_guard_needs_a_prior_sync() {
        let mut batch = received_batch();
        assert!(batch.revert_guard().is_err());
        batch.synced_at = Some(Utc::now());
        assert!(batch.revert_guard().is_ok());
    }
}
