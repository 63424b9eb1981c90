//! Order intake: validate, persist atomically, dispatch work
//!
//! The order row, all item rows, and the initial `received` status-log
//! row are committed in one transaction. The work message is published
//! only after commit; a publish failure is logged and does not fail the
//! request — the order is already durable, and "created" and "queued"
//! are independently observable facts.

use chrono::Utc;
use rust_decimal::Decimal;
use shared::message::WorkMessage;
use shared::models::{
    CreateOrderRequest, CreateOrderResponse, OrderStatus, OrderType, format_order_number,
    priority_for_total,
};

use crate::db;
use crate::error::{ServiceError, ServiceResult};
use crate::state::OrderState;

/// Author recorded for intake-side status-log rows
const INTAKE_ACTOR: &str = "order-service";

/// Retries after an order-number unique-constraint conflict (another
/// instance allocated the same number)
const NUMBER_CONFLICT_RETRIES: u32 = 3;

/// Create an order from a validated request and dispatch it to the
/// kitchen.
pub async fn submit(
    state: &OrderState,
    request: CreateOrderRequest,
) -> ServiceResult<CreateOrderResponse> {
    let order_type = request.validate()?;
    let total_amount = request.total_amount();
    let priority = priority_for_total(total_amount);

    let order_number = persist_with_unique_number(state, &request, order_type, total_amount, priority).await?;

    let work = WorkMessage {
        order_number: order_number.clone(),
        customer_name: request.customer_name.clone(),
        order_type,
        table_number: request.table_number,
        delivery_address: request.delivery_address.clone(),
        items: request.items.clone(),
        total_amount,
        priority,
    };
    if let Err(e) = state.publisher.publish_work(&work).await {
        // the order is committed; work dispatch is best-effort
        tracing::error!(
            error = %e,
            order_number = %order_number,
            "failed to publish work message for committed order"
        );
    }

    Ok(CreateOrderResponse {
        order_number,
        status: OrderStatus::Received,
        total_amount,
    })
}

/// Allocate a daily-unique number and persist the order, retrying on a
/// number collision by reseeding the counter from the store.
async fn persist_with_unique_number(
    state: &OrderState,
    request: &CreateOrderRequest,
    order_type: OrderType,
    total_amount: Decimal,
    priority: i32,
) -> ServiceResult<String> {
    let mut attempt = 0;
    loop {
        let order_number = next_order_number(state).await?;
        match persist_order(state, request, order_type, &order_number, total_amount, priority).await
        {
            Ok(()) => return Ok(order_number),
            Err(e) if e.is_unique_violation() && attempt < NUMBER_CONFLICT_RETRIES => {
                attempt += 1;
                tracing::warn!(
                    order_number = %order_number,
                    attempt,
                    "order number already taken, reseeding counter"
                );
                state.sequence.lock().await.reset();
            }
            Err(e) => return Err(e),
        }
    }
}

/// Allocate the next `ORD_YYYYMMDD_NNN` number under the intake mutex,
/// seeding the counter from the store on first use or day rollover.
async fn next_order_number(state: &OrderState) -> ServiceResult<String> {
    let today = Utc::now().date_naive();
    let mut sequence = state.sequence.lock().await;
    if sequence.needs_seed(today) {
        let last_used = db::orders::last_daily_sequence(&state.pool, today).await?;
        sequence.seed(today, last_used);
    }
    let number = sequence.next(today);
    Ok(format_order_number(today, number))
}

/// One atomic transaction: order row + item rows + initial status log.
async fn persist_order(
    state: &OrderState,
    request: &CreateOrderRequest,
    order_type: OrderType,
    order_number: &str,
    total_amount: Decimal,
    priority: i32,
) -> Result<(), ServiceError> {
    let mut tx = state.pool.begin().await?;

    let order_id = db::orders::insert_order(
        &mut *tx,
        order_number,
        &request.customer_name,
        order_type.as_str(),
        request.table_number,
        request.delivery_address.as_deref(),
        total_amount,
        priority,
    )
    .await?;

    db::orders::insert_order_items(&mut *tx, order_id, &request.items).await?;
    db::orders::insert_status_log(
        &mut *tx,
        order_id,
        OrderStatus::Received,
        INTAKE_ACTOR,
        "Order received and queued for processing",
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        order_number = %order_number,
        order_type = %order_type,
        %total_amount,
        priority,
        "order created"
    );
    Ok(())
}
