//! Cut batches: read-only views plus the one-shot sync and its reversal.
//!
//! Batches themselves are written by the workshop workflow, not here.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use atelier_core::CutBatchId;

use crate::app::{AppServices, errors, routes::common};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_cut_batches))
        .route("/:id", get(get_cut_batch))
        .route("/:id/sync", post(sync_cut_batch))
        .route("/:id/revert", post(revert_cut_batch))
}

pub async fn list_cut_batches(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match common::run(move || services.cuts.list()).await {
        Ok(batches) => (StatusCode::OK, Json(batches)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn get_cut_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let batch_id = match id.parse::<CutBatchId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid cut batch id",
            );
        }
    };

    match common::run(move || services.cuts.get(batch_id)).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Book the batch's good units into stock. One-shot; repeats get a 409.
pub async fn sync_cut_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let batch_id = match id.parse::<CutBatchId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid cut batch id",
            );
        }
    };

    match common::run(move || services.cuts.sync(batch_id, common::SYSTEM_ACTOR)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Take a synced batch's units back out, using the same decomposition.
pub async fn revert_cut_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let batch_id = match id.parse::<CutBatchId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid cut batch id",
            );
        }
    };

    match common::run(move || services.cuts.revert(batch_id, common::SYSTEM_ACTOR)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
