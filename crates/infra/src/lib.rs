//! `atelier-infra` — the stock engine, its storage backends and the
//! workflow services that drive them.
//!
//! All balance changes funnel through [`StockEngine`]: services build
//! movement drafts from the domain crates, the engine checks preconditions
//! against current balances and commits the ledger append together with the
//! cached-balance update. Two backends implement [`StockStore`]: an
//! in-memory store for tests and small deployments, and a Postgres store
//! for everything else.

pub mod engine;
pub mod services;
pub mod store;


pub use engine::{EngineError, EngineResult, MovementContext, StockEngine};
pub use store::{
    InMemoryStockStore, MovementFilter, PostgresStockStore, SkuRecord, StockStore, StoreError,
};
