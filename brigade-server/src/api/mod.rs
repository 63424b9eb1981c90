//! HTTP API layer
//!
//! One router per HTTP-serving mode. Every response that is not a
//! success carries `{error, timestamp, request_id}`; 5xx responses are
//! reduced to a generic message, with the detail retained in logs under
//! the request id.

pub mod health;
pub mod orders;
pub mod tracking;

use axum::Router;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::{SecondsFormat, Utc};
use http::StatusCode;
use shared::error::AppError;
use tower::ServiceBuilder;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;

use crate::error::ServiceError;
use crate::state::{OrderState, TrackingState};

/// Router of the order-service mode
pub fn order_router(state: OrderState) -> Router {
    with_observability(
        Router::new()
            .route("/orders", post(orders::create_order))
            .route("/health", get(health::order_service_health))
            .with_state(state),
    )
}

/// Router of the tracking-service mode
pub fn tracking_router(state: TrackingState) -> Router {
    with_observability(
        Router::new()
            .route("/orders/{number}/status", get(tracking::order_status))
            .route("/orders/{number}/history", get(tracking::order_history))
            .route("/workers/status", get(tracking::workers_status))
            .route("/health", get(health::tracking_service_health))
            .with_state(state),
    )
}

/// Request-id generation/propagation plus request tracing
fn with_observability(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Printable form of the propagated `x-request-id`
pub fn request_id_string(request_id: &RequestId) -> String {
    request_id
        .header_value()
        .to_str()
        .unwrap_or("unknown")
        .to_string()
}

/// API-layer error: an [`AppError`] bound to the request it failed
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    request_id: String,
}

impl ApiError {
    /// Wrap an application error. Server-side errors are logged in full
    /// and reduced to their generic code message for the caller.
    pub fn from_app(err: AppError, request_id: &str) -> Self {
        let status = err.http_status();
        let message = if status.is_server_error() {
            tracing::error!(
                code = %err.code,
                error = %err.message,
                request_id,
                "request failed"
            );
            err.code.message().to_string()
        } else {
            err.message
        };
        Self {
            status,
            message,
            request_id: request_id.to_string(),
        }
    }

    pub fn from_service(err: ServiceError, request_id: &str) -> Self {
        Self::from_app(AppError::from(err), request_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "request_id": self.request_id,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_carries_field_message() {
        let err = AppError::validation("delivery_address", "delivery_address is required");
        let response = ApiError::from_app(err, "req-1").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "delivery_address: delivery_address is required"
        );
        assert_eq!(body["request_id"], "req-1");
        assert!(body.get("timestamp").is_some());
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let err = AppError::database("connection reset by postgres");
        let response = ApiError::from_app(err, "req-2").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // the stored detail never reaches the caller
        let body = body_json(response).await;
        assert_eq!(body["error"], "Database error");
        assert_eq!(body["request_id"], "req-2");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let err = AppError::order_not_found("ORD_20260807_001");
        let response = ApiError::from_app(err, "req-3").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
