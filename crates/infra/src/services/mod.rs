//! Lifecycle services.
//!
//! Each service owns one document type, validates through the domain crates
//! and drives every stock change through the engine. Services are the write
//! surface the API exposes; nothing else touches balances.

pub mod audit;
pub mod cut_sync;
pub mod orders;
pub mod production;
pub mod returns;
pub mod stock;

pub use audit::{AuditReport, audit_sku};
pub use cut_sync::{CutSyncLine, CutSyncReport, CutSyncService};
pub use orders::{NewOrder, OrderService};
pub use production::{NewProductionOrder, ProductionService};
pub use returns::{NewReturn, ReturnService};
pub use stock::StockService;

use crate::engine::EngineError;

pub(crate) fn degraded(detail: String) -> EngineError {
    EngineError::Degraded { detail }
}
