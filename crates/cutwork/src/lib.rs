//! `atelier-cutwork` — externally-managed cut batches and the reconciliation
//! math that turns a received batch into per-variant stock entries.
//!
//! The batch lifecycle (creating, sending to a workshop, receiving) lives in
//! the faction-management workflow, not here. This crate only models the
//! record that workflow produces and computes the deterministic good-unit
//! decomposition the sync applies.

pub mod cut_batch;
pub mod decompose;

pub use cut_batch::{CutBatch, CutItem, CutStatus, GradeEntry};
pub use decompose::{good_unit_allocations, Allocation};
