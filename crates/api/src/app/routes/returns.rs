//! Customer returns against dispatched orders.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use atelier_core::{OrderId, SkuId};
use atelier_infra::services::NewReturn;
use atelier_returns::ReturnItem;

use crate::app::{AppServices, dto, errors, routes::common};

pub fn router() -> Router {
    Router::new().route("/", get(list_returns).post(create_return))
}

pub async fn list_returns(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match common::run(move || services.returns.list()).await {
        Ok(returns) => (StatusCode::OK, Json(returns)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}

pub async fn create_return(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateReturnRequest>,
) -> axum::response::Response {
    let order_id = match body.order_id.parse::<OrderId>() {
        Ok(parsed) => parsed,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
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
        items.push(ReturnItem {
            sku_id,
            quantity: item.quantity,
        });
    }

    let input = NewReturn {
        order_id,
        items,
        reason: body.reason,
        note: body.note,
        actor: common::actor(body.actor),
    };

    match common::run(move || services.returns.create(input)).await {
        Ok(sales_return) => (StatusCode::CREATED, Json(sales_return)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
