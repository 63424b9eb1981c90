//! `POST /orders` — order intake endpoint

use axum::Json;
use axum::extract::{Extension, State};
use bytes::Bytes;
use shared::error::AppError;
use shared::models::{CreateOrderRequest, CreateOrderResponse};
use tower_http::request_id::RequestId;

use super::{ApiError, request_id_string};
use crate::services::intake;
use crate::state::OrderState;

pub async fn create_order(
    State(state): State<OrderState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let request_id = request_id_string(&request_id);

    let request: CreateOrderRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, %request_id, "rejected malformed order body");
        ApiError::from_app(AppError::invalid_request("Invalid JSON format"), &request_id)
    })?;

    // concurrency bound: wait for an intake slot until the deadline
    let _permit = tokio::time::timeout(
        state.config.operation_timeout,
        state.intake_permits.clone().acquire_owned(),
    )
    .await
    .map_err(|_| {
        ApiError::from_app(AppError::timeout("order intake at capacity"), &request_id)
    })?
    .map_err(|_| ApiError::from_app(AppError::internal("intake semaphore closed"), &request_id))?;

    let response = tokio::time::timeout(
        state.config.operation_timeout,
        intake::submit(&state, request),
    )
    .await
    .map_err(|_| ApiError::from_app(AppError::timeout("order creation timed out"), &request_id))?
    .map_err(|e| ApiError::from_service(e, &request_id))?;

    tracing::debug!(
        order_number = %response.order_number,
        %request_id,
        "order created"
    );
    Ok(Json(response))
}
