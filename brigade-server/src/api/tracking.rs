//! Read-only tracking endpoints

use axum::Json;
use axum::extract::{Extension, Path, State};
use shared::error::AppError;
use shared::models::{
    OrderStatus, OrderStatusEntry, OrderTrackingResponse, OrderType, WorkerStatus,
    WorkerStatusResponse, effective_worker_status,
};
use tower_http::request_id::RequestId;

use super::{ApiError, request_id_string};
use crate::db;
use crate::error::ServiceError;
use crate::state::TrackingState;

/// `GET /orders/{number}/status`
pub async fn order_status(
    State(state): State<TrackingState>,
    Extension(request_id): Extension<RequestId>,
    Path(number): Path<String>,
) -> Result<Json<OrderTrackingResponse>, ApiError> {
    let request_id = request_id_string(&request_id);

    let row = db::orders::find_tracking(&state.pool, &number)
        .await
        .map_err(|e| ApiError::from_service(e.into(), &request_id))?
        .ok_or_else(|| ApiError::from_app(AppError::order_not_found(&number), &request_id))?;

    let status = parse_stored::<OrderStatus>(&row.status)
        .map_err(|e| ApiError::from_service(e, &request_id))?;
    let order_type = parse_stored::<OrderType>(&row.order_type)
        .map_err(|e| ApiError::from_service(e, &request_id))?;

    // only a cooking order has a meaningful completion estimate
    let estimated_completion = (status == OrderStatus::Cooking).then(|| {
        row.updated_at
            + chrono::Duration::from_std(state.config.prep_time(order_type))
                .unwrap_or_else(|_| chrono::Duration::seconds(0))
    });

    Ok(Json(OrderTrackingResponse {
        order_number: row.number,
        current_status: status,
        updated_at: row.updated_at,
        estimated_completion,
        processed_by: row.processed_by,
    }))
}

/// `GET /orders/{number}/history`
pub async fn order_history(
    State(state): State<TrackingState>,
    Extension(request_id): Extension<RequestId>,
    Path(number): Path<String>,
) -> Result<Json<Vec<OrderStatusEntry>>, ApiError> {
    let request_id = request_id_string(&request_id);

    let exists = db::orders::exists(&state.pool, &number)
        .await
        .map_err(|e| ApiError::from_service(e.into(), &request_id))?;
    if !exists {
        return Err(ApiError::from_app(AppError::order_not_found(&number), &request_id));
    }

    let rows = db::orders::status_history(&state.pool, &number)
        .await
        .map_err(|e| ApiError::from_service(e.into(), &request_id))?;

    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        history.push(OrderStatusEntry {
            status: parse_stored::<OrderStatus>(&row.status)
                .map_err(|e| ApiError::from_service(e, &request_id))?,
            changed_by: row.changed_by,
            timestamp: row.changed_at,
            notes: row.notes,
        });
    }
    Ok(Json(history))
}

/// `GET /workers/status`
///
/// The roster reports a derived status: a worker whose heartbeat is
/// older than twice the heartbeat interval is shown offline regardless
/// of its persisted status column.
pub async fn workers_status(
    State(state): State<TrackingState>,
    Extension(request_id): Extension<RequestId>,
) -> Result<Json<Vec<WorkerStatusResponse>>, ApiError> {
    let request_id = request_id_string(&request_id);

    let rows = db::workers::list(&state.pool)
        .await
        .map_err(|e| ApiError::from_service(e.into(), &request_id))?;

    let now = chrono::Utc::now();
    let mut roster = Vec::with_capacity(rows.len());
    for row in rows {
        let stored = match row.status.as_str() {
            "online" => WorkerStatus::Online,
            _ => WorkerStatus::Offline,
        };
        roster.push(WorkerStatusResponse {
            worker_name: row.name,
            status: effective_worker_status(
                stored,
                row.last_seen,
                now,
                state.config.heartbeat_interval,
            ),
            orders_processed: row.orders_processed,
            last_seen: row.last_seen,
        });
    }
    Ok(Json(roster))
}

fn parse_stored<T: std::str::FromStr>(value: &str) -> Result<T, ServiceError> {
    value
        .parse()
        .map_err(|_| ServiceError::Infra(format!("unexpected value in store: {value}").into()))
}
