//! `atelier-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod variant;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, CutBatchId, MovementId, OrderId, ProductionOrderId, ReturnId, SkuId};
pub use variant::VariantKey;
pub use version::ExpectedVersion;
