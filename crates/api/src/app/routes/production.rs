//! Internal production orders. Stock enters exactly once, on completion.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use atelier_core::{ProductionOrderId, SkuId};
use atelier_infra::services::NewProductionOrder;

use crate::app::{AppServices, dto, errors, routes::common};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_production_orders).post(create_production_order))
        .route("/:id", get(get_production_order))
        .route("/:id/advance", post(advance_production_order))
        .route("/:id/cancel", post(cancel_production_order))
        .route("/:id/reopen", post(reopen_production_order))
}

pub async fn list_production_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match common::run(move || services.production.list()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn create_production_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductionOrderRequest>,
) -> axum::response::Response {
    let sku_id = match body.sku_id.parse::<SkuId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
        }
    };

    let input = NewProductionOrder {
        sku_id,
        quantity: body.quantity,
        assignee: body.assignee,
        note: body.note,
    };

    match common::run(move || services.production.create(input)).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn get_production_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match id.parse::<ProductionOrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid production order id",
            );
        }
    };

    match common::run(move || services.production.get(order_id)).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Move one stage up the ladder; the completing step books the stock in.
pub async fn advance_production_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match id.parse::<ProductionOrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid production order id",
            );
        }
    };

    match common::run(move || services.production.advance(order_id, common::SYSTEM_ACTOR)).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn cancel_production_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match id.parse::<ProductionOrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid production order id",
            );
        }
    };

    match common::run(move || services.production.cancel(order_id)).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Pull a completed order back to an earlier stage, withdrawing its stock.
pub async fn reopen_production_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReopenProductionRequest>,
) -> axum::response::Response {
    let order_id = match id.parse::<ProductionOrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid production order id",
            );
        }
    };

    match common::run(move || {
        let actor = common::actor(body.actor);
        services.production.reopen(order_id, body.to, &actor)
    })
    .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
