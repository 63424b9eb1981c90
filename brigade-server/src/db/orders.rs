//! Order, order-item, and status-log queries

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::models::{OrderItem, OrderStatus};
use sqlx::{PgConnection, PgPool};

/// Tracking projection of an order row
#[derive(sqlx::FromRow)]
pub struct OrderTrackingRow {
    pub number: String,
    #[sqlx(rename = "type")]
    pub order_type: String,
    pub status: String,
    pub processed_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the status audit trail
#[derive(sqlx::FromRow)]
pub struct StatusLogRow {
    pub status: String,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Insert the order row; returns the generated id.
#[allow(clippy::too_many_arguments)]
pub async fn insert_order(
    conn: &mut PgConnection,
    number: &str,
    customer_name: &str,
    order_type: &str,
    table_number: Option<i32>,
    delivery_address: Option<&str>,
    total_amount: Decimal,
    priority: i32,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO orders (number, customer_name, type, table_number, delivery_address, total_amount, priority, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'received')
         RETURNING id",
    )
    .bind(number)
    .bind(customer_name)
    .bind(order_type)
    .bind(table_number)
    .bind(delivery_address)
    .bind(total_amount)
    .bind(priority)
    .fetch_one(conn)
    .await
}

/// Insert all line items of an order.
pub async fn insert_order_items(
    conn: &mut PgConnection,
    order_id: i64,
    items: &[OrderItem],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query("INSERT INTO order_items (order_id, name, quantity, price) VALUES ($1, $2, $3, $4)")
            .bind(order_id)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Append a status-log row.
pub async fn insert_status_log(
    conn: &mut PgConnection,
    order_id: i64,
    status: OrderStatus,
    changed_by: &str,
    notes: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_status_log (order_id, status, changed_by, notes) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(status.as_str())
        .bind(changed_by)
        .bind(notes)
        .execute(conn)
        .await?;
    Ok(())
}

/// Highest order sequence already used today (0 when none), parsed out
/// of the `ORD_YYYYMMDD_NNN` numbers.
pub async fn last_daily_sequence(pool: &PgPool, date: NaiveDate) -> Result<u32, sqlx::Error> {
    let pattern = format!("ORD_{}_%", date.format("%Y%m%d"));
    let last: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(CAST(SUBSTRING(number FROM 'ORD_[0-9]{8}_([0-9]{3})') AS INTEGER)), 0)
         FROM orders
         WHERE number LIKE $1",
    )
    .bind(&pattern)
    .fetch_one(pool)
    .await?;
    Ok(last.max(0) as u32)
}

/// Conditionally transition an order to `cooking`.
///
/// Returns the order id when the transition happened, `None` when the
/// order was not in `received` anymore (redelivered message — the
/// caller treats this as a successful no-op).
pub async fn transition_to_cooking(
    conn: &mut PgConnection,
    number: &str,
    worker_name: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE orders SET status = 'cooking', processed_by = $1, updated_at = NOW()
         WHERE number = $2 AND status = 'received'
         RETURNING id",
    )
    .bind(worker_name)
    .bind(number)
    .fetch_optional(conn)
    .await
}

/// Conditionally transition an order to `ready`, stamping completion.
///
/// Returns the order id when the transition happened, `None` when the
/// order already advanced past `cooking`.
pub async fn transition_to_ready(
    conn: &mut PgConnection,
    number: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE orders SET status = 'ready', completed_at = NOW(), updated_at = NOW()
         WHERE number = $1 AND status = 'cooking'
         RETURNING id",
    )
    .bind(number)
    .fetch_optional(conn)
    .await
}

/// Tracking projection by order number.
pub async fn find_tracking(
    pool: &PgPool,
    number: &str,
) -> Result<Option<OrderTrackingRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT number, type, status, processed_by, updated_at
         FROM orders
         WHERE number = $1",
    )
    .bind(number)
    .fetch_optional(pool)
    .await
}

/// True when an order with this number exists.
pub async fn exists(pool: &PgPool, number: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE number = $1)")
        .bind(number)
        .fetch_one(pool)
        .await
}

/// Full chronological status history of an order.
pub async fn status_history(
    pool: &PgPool,
    number: &str,
) -> Result<Vec<StatusLogRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT status, changed_by, changed_at, notes
         FROM order_status_log
         WHERE order_id = (SELECT id FROM orders WHERE number = $1)
         ORDER BY changed_at ASC",
    )
    .bind(number)
    .fetch_all(pool)
    .await
}
