//! Axum application wiring.
//!
//! Folder guide:
//! - `services.rs`: store selection and the shared [`AppServices`] bundle
//! - `routes/`: one file per resource, each exposing a `router()`
//! - `dto.rs`: request payloads and the SKU response mapper
//! - `errors.rs`: engine error to HTTP status mapping

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the application with the store picked from the environment.
pub async fn build_app() -> Router {
    let services = Arc::new(services::build_services().await);
    build_app_with(services)
}

/// Assemble the router over pre-built services. Tests use this to wire a
/// store they keep a handle on.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
