//! API error types with HTTP response mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use services::ServiceError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"message": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// No caller identity on a protected route.
    Unauthorized(&'static str),
    /// Caller lacks the required role.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Service layer error.
    Service(ServiceError),
}

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Service(err) => (service_status(&err), err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        metrics::counter!("api_errors_total", "status" => status.as_u16().to_string())
            .increment(1);

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        let body = serde_json::json!({ "message": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Domain(domain) => match domain {
            DomainError::Validation(_) | DomainError::EmptyCart => StatusCode::BAD_REQUEST,
            DomainError::CartItemNotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::InvalidTransition { .. } => StatusCode::CONFLICT,
        },
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::StockUnavailable { .. } => StatusCode::BAD_REQUEST,
        ServiceError::InsufficientStock { .. } => StatusCode::CONFLICT,
        ServiceError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Store(_) | ServiceError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Service(ServiceError::Domain(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("Not Found - {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_service_error_statuses() {
        assert_eq!(
            status_of(DomainError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                DomainError::InvalidTransition {
                    field: "orderStatus",
                    from: "Delivered",
                    to: "Cancelled",
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::Timeout.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(
                ServiceError::InsufficientStock {
                    product_id: ProductId::new(),
                    name: "Lamp".to_string(),
                    requested: 2,
                    available: 1,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                ServiceError::StockUnavailable {
                    product_id: ProductId::new(),
                    requested: 2,
                    available: 1,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_body_is_message_object() {
        let response = ApiError::Unauthorized("Not authorized, no token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "Not authorized, no token" }));
    }
}
