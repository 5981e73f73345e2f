//! Customer orders: creation reserves every line, status changes move stock.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use atelier_core::{CustomerId, OrderId, SkuId};
use atelier_infra::services::NewOrder;
use atelier_orders::OrderItem;

use crate::app::{AppServices, dto, errors, routes::common};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", post(set_status))
        .route("/:id/payment", post(set_payment_status))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match common::run(move || services.orders.list()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let customer_id = match body.customer_id.parse::<CustomerId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid customer id",
            );
        }
    };
    let mut items = Vec::with_capacity(body.items.len());
    for item in body.items {
        let sku_id = match item.sku_id.parse::<SkuId>() {
            Ok(parsed) => parsed,
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid sku id in items",
                );
            }
        };
        items.push(OrderItem {
            sku_id,
            quantity: item.quantity,
        });
    }

    let input = NewOrder {
        customer_id,
        items,
        note: body.note,
        actor: common::actor(body.actor),
    };

    match common::run(move || services.orders.create(input)).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match id.parse::<OrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match common::run(move || services.orders.get(order_id)).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetOrderStatusRequest>,
) -> axum::response::Response {
    let order_id = match id.parse::<OrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match common::run(move || {
        let actor = common::actor(body.actor);
        services.orders.set_status(order_id, body.status, &actor)
    })
    .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

/// Payment status is back-office bookkeeping; no stock moves here.
pub async fn set_payment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetPaymentStatusRequest>,
) -> axum::response::Response {
    let order_id = match id.parse::<OrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    match common::run(move || services.orders.set_payment_status(order_id, body.status)).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
