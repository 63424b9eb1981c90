//! Database access layer
//!
//! Free functions over a `PgPool` (or an open transaction), grouped per
//! table family. All cross-process coordination happens here; the only
//! in-process shared state is the intake order-number counter.

pub mod orders;
pub mod workers;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connection pool bounds
const MAX_CONNECTIONS: u32 = 25;
const MIN_CONNECTIONS: u32 = 5;
const MAX_LIFETIME: Duration = Duration::from_secs(60 * 60);
const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Startup connect retries
const CONNECT_ATTEMPTS: u32 = 5;

/// Connect to PostgreSQL with bounded retries and increasing backoff.
pub async fn connect(database_url: &str) -> Result<PgPool, BoxError> {
    let options = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .max_lifetime(MAX_LIFETIME)
        .idle_timeout(IDLE_TIMEOUT);

    let mut last_err: Option<sqlx::Error> = None;
    for attempt in 1..=CONNECT_ATTEMPTS {
        match options.clone().connect(database_url).await {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                let wait = Duration::from_secs(2 * attempt as u64);
                if attempt < CONNECT_ATTEMPTS {
                    tracing::error!(
                        error = %e,
                        attempt,
                        "failed to connect to database, retrying in {wait:?}"
                    );
                    tokio::time::sleep(wait).await;
                }
                last_err = Some(e);
            }
        }
    }

    Err(format!(
        "failed to connect to database after {CONNECT_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )
    .into())
}

/// Apply embedded migrations (filename-sorted, one transaction each).
pub async fn migrate(pool: &PgPool) -> Result<(), BoxError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Store connectivity probe for health checks.
pub async fn ping(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
