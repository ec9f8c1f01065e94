//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed ID, missing header).
    BadRequest(String),
    /// Workflow error, mapped per variant.
    Order(OrderError),
    /// Resource not found.
    NotFound(String),
    /// The request was well-formed but refused in the current state.
    Conflict(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({ "error": msg })),
            ApiError::Order(err) => order_error_to_response(err),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, serde_json::Value) {
    match err {
        // Rejected carries every cart issue; clients fix the cart in one
        // round trip.
        OrderError::Rejected(issues) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({
                "error": "cart rejected",
                "issues": issues,
            }),
        ),
        OrderError::EmptyCart => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({ "error": err.to_string() }),
        ),
        OrderError::NotFound => (
            StatusCode::NOT_FOUND,
            serde_json::json!({ "error": err.to_string() }),
        ),
        OrderError::InvalidTransition { .. } | OrderError::Conflict => (
            StatusCode::CONFLICT,
            serde_json::json!({ "error": err.to_string() }),
        ),
        OrderError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "internal server error" }),
            )
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use orders::CartIssue;

    #[test]
    fn rejected_maps_to_unprocessable_entity() {
        let err = OrderError::Rejected(vec![CartIssue::Unavailable {
            product_id: ProductId::new(),
        }]);
        let (status, body) = order_error_to_response(err);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["issues"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn conflict_maps_to_409() {
        let (status, _) = order_error_to_response(OrderError::Conflict);
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
