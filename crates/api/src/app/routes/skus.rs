//! Variant registry, stock receipts, manual adjustments and the audit view.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use atelier_core::{SkuId, VariantKey};

use crate::app::{AppServices, dto, errors, routes::common};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_skus).post(register_sku))
        .route("/:id", get(get_sku))
        .route("/:id/audit", get(audit_sku))
        .route("/:id/adjustments", post(adjust_stock))
        .route("/:id/receipts", post(receive_stock))
}

pub async fn list_skus(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match common::run(move || services.stock.skus()).await {
        Ok(records) => {
            let body: Vec<_> = records.iter().map(dto::sku_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Find-or-create: posting an already known variant returns its record.
pub async fn register_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterSkuRequest>,
) -> axum::response::Response {
    let key = match VariantKey::new(&body.reference, &body.color, &body.size) {
        Ok(key) => key,
        Err(error) => return errors::engine_error_to_response(error.into()),
    };

    match common::run(move || services.stock.register_variant(&key)).await {
        Ok(record) => (StatusCode::OK, Json(dto::sku_to_json(&record))).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn get_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let sku_id = match id.parse::<SkuId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
        }
    };

    match common::run(move || services.stock.sku(sku_id)).await {
        Ok(record) => (StatusCode::OK, Json(dto::sku_to_json(&record))).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Replay the SKU's ledger and compare against the cached balances.
pub async fn audit_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let sku_id = match id.parse::<SkuId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
        }
    };

    match common::run(move || services.stock.audit(sku_id)).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let sku_id = match id.parse::<SkuId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
        }
    };

    match common::run(move || {
        let actor = common::actor(body.actor);
        services.stock.adjust(sku_id, body.delta, body.note, &actor)
    })
    .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::sku_to_json(&record))).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> axum::response::Response {
    let sku_id = match id.parse::<SkuId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
        }
    };

    match common::run(move || {
        let actor = common::actor(body.actor);
        services
            .stock
            .receive_purchase(sku_id, body.quantity, body.note, body.reference, &actor)
    })
    .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::sku_to_json(&record))).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
