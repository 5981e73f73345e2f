//! Movement ledger queries. The ledger is append-only; this is read-only.

use std::sync::Arc;

use axum::{
    Extension, Json, Router, extract::Query, http::StatusCode, response::IntoResponse,
    routing::get,
};

use atelier_core::SkuId;
use atelier_infra::MovementFilter;
use atelier_ledger::MovementKind;

use crate::app::{AppServices, dto, errors, routes::common};

pub fn router() -> Router {
    Router::new().route("/", get(list_movements))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::MovementsQuery>,
) -> axum::response::Response {
    let sku_id = match query.sku_id {
        Some(raw) => match raw.parse::<SkuId>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid sku id");
            }
        },
        None => None,
    };
    let kind = match query.kind {
        Some(raw) => match raw.parse::<MovementKind>() {
            Ok(parsed) => Some(parsed),
            Err(error) => return errors::engine_error_to_response(error.into()),
        },
        None => None,
    };

    let filter = MovementFilter {
        sku_id,
        kind,
        reference: query.reference,
        limit: query.limit,
    };

    match common::run(move || services.stock.movements(&filter)).await {
        Ok(movements) => (StatusCode::OK, Json(movements)).into_response(),
        Err(error) => errors::engine_error_to_response(error),
    }
}
