//! Shared application state per service mode

use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

use crate::config::Config;
use crate::messaging::Publisher;
use crate::services::sequence::OrderSequence;

/// State of the order-service mode
#[derive(Clone)]
pub struct OrderState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Work/notification publisher
    pub publisher: Publisher,
    /// Process-local daily order-number counter; the database unique
    /// constraint is the cross-process backstop
    pub sequence: Arc<Mutex<OrderSequence>>,
    /// Bounds concurrent in-flight submissions
    pub intake_permits: Arc<Semaphore>,
}

impl OrderState {
    pub fn new(
        config: Arc<Config>,
        pool: PgPool,
        publisher: Publisher,
        max_concurrent: usize,
    ) -> Self {
        Self {
            pool,
            config,
            publisher,
            sequence: Arc::new(Mutex::new(OrderSequence::new())),
            intake_permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }
}

/// State of the tracking-service mode (read-only)
#[derive(Clone)]
pub struct TrackingState {
    pub pool: PgPool,
    pub config: Arc<Config>,
}

impl TrackingState {
    pub fn new(config: Arc<Config>, pool: PgPool) -> Self {
        Self { pool, config }
    }
}
