//! Health check endpoints

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{SecondsFormat, Utc};
use http::StatusCode;

use crate::db;
use crate::state::{OrderState, TrackingState};

pub async fn order_service_health(State(state): State<OrderState>) -> impl IntoResponse {
    check(&state.pool, "order-service").await
}

pub async fn tracking_service_health(State(state): State<TrackingState>) -> impl IntoResponse {
    check(&state.pool, "tracking-service").await
}

async fn check(pool: &sqlx::PgPool, service: &str) -> (StatusCode, Json<serde_json::Value>) {
    let healthy = db::ping(pool).await;
    let (status_code, status) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };
    (
        status_code,
        Json(serde_json::json!({
            "status": status,
            "service": service,
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "healthy": healthy,
        })),
    )
}
