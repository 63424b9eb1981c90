//! Worker registry queries

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

/// Roster row
#[derive(sqlx::FromRow)]
#[allow(dead_code)]
pub struct WorkerRow {
    pub name: String,
    #[sqlx(rename = "type")]
    pub worker_type: String,
    pub status: String,
    pub orders_processed: i64,
    pub last_seen: DateTime<Utc>,
}

/// Number of workers with this name currently marked online.
pub async fn count_online(pool: &PgPool, name: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM workers WHERE name = $1 AND status = 'online'")
        .bind(name)
        .fetch_one(pool)
        .await
}

/// Register a worker, reviving a previous offline row for the same name.
pub async fn register(pool: &PgPool, name: &str, worker_type: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO workers (name, type, status)
         VALUES ($1, $2, 'online')
         ON CONFLICT (name) DO UPDATE SET
             type = EXCLUDED.type,
             status = 'online',
             last_seen = NOW()
         RETURNING id",
    )
    .bind(name)
    .bind(worker_type)
    .fetch_one(pool)
    .await
}

/// Update the worker status and heartbeat timestamp.
pub async fn set_status(pool: &PgPool, name: &str, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE workers SET status = $1, last_seen = NOW() WHERE name = $2")
        .bind(status)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

/// Increment the cumulative processed counter and refresh `last_seen`.
pub async fn increment_processed(conn: &mut PgConnection, name: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE workers SET orders_processed = orders_processed + 1, last_seen = NOW()
         WHERE name = $1",
    )
    .bind(name)
    .execute(conn)
    .await?;
    Ok(())
}

/// Full worker roster, oldest registrations first.
pub async fn list(pool: &PgPool) -> Result<Vec<WorkerRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT name, type, status, orders_processed, last_seen
         FROM workers
         ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}
