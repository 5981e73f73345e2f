//! HTTP routes, one file per resource.

use axum::Router;

pub mod common;
pub mod cuts;
pub mod movements;
pub mod orders;
pub mod production;
pub mod returns;
pub mod skus;
pub mod system;

/// Everything except `/health`.
pub fn router() -> Router {
    Router::new()
        .nest("/skus", skus::router())
        .nest("/movements", movements::router())
        .nest("/orders", orders::router())
        .nest("/production-orders", production::router())
        .nest("/returns", returns::router())
        .nest("/cut-batches", cuts::router())
}
