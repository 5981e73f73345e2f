//! Engine error to HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use atelier_core::DomainError;
use atelier_infra::{EngineError, StoreError};

/// Uniform error body: `{"error": code, "message": ...}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({ "error": code, "message": message.into() })),
    )
        .into_response()
}

/// Map an engine failure onto an HTTP status. Validation lands on 400,
/// missing documents on 404, deterministic re-check losses on 409, balance
/// preconditions on 422, degraded state on 500 and store outages on 503.
pub fn engine_error_to_response(error: EngineError) -> axum::response::Response {
    match error {
        EngineError::Domain(domain) => domain_error_to_response(domain),
        EngineError::Store(store) => store_error_to_response(store),
        EngineError::Degraded { detail } => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "degraded_state", detail)
        }
    }
}

fn domain_error_to_response(error: DomainError) -> axum::response::Response {
    match error {
        DomainError::Validation(message) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        DomainError::InvalidId(message) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", message)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(message) => json_error(StatusCode::CONFLICT, "conflict", message),
        error @ DomainError::InsufficientStock { .. } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_stock",
            error.to_string(),
        ),
        DomainError::InvariantViolation(message) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "invariant_violation",
            message,
        ),
    }
}

fn store_error_to_response(error: StoreError) -> axum::response::Response {
    match error {
        StoreError::NotFound(message) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StoreError::VersionConflict(message) => {
            json_error(StatusCode::CONFLICT, "conflict", message)
        }
        StoreError::Unavailable(message) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
        }
    }
}
