//! Fulfillment worker: claims work, drives the cooking lifecycle
//!
//! Per message: `received → cooking → ready`, each transition a
//! conditional update inside its own transaction. A redelivered message
//! whose order already advanced is completed as a no-op, so duplicate
//! deliveries never re-publish notifications or double-increment the
//! processed counter.

use async_nats::jetstream;
use bytes::Bytes;
use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::message::{StatusNotification, WorkMessage};
use shared::models::{OrderStatus, OrderType};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::messaging::{HandlerOutcome, Publisher, run_consumer, topology};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Delay before rebuilding the consumer after a broker failure
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct KitchenWorker {
    name: String,
    specializations: Vec<OrderType>,
    heartbeat_interval: Duration,
    prefetch: usize,
    pool: PgPool,
    context: jetstream::Context,
    publisher: Publisher,
    config: Arc<Config>,
    shutdown: CancellationToken,
}

impl KitchenWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        specializations: Vec<OrderType>,
        heartbeat_interval: Duration,
        prefetch: usize,
        pool: PgPool,
        context: jetstream::Context,
        config: Arc<Config>,
        shutdown: CancellationToken,
    ) -> Self {
        let publisher = Publisher::new(context.clone());
        Self {
            name,
            specializations,
            heartbeat_interval,
            prefetch,
            pool,
            context,
            publisher,
            config,
            shutdown,
        }
    }

    /// Register, start the heartbeat, and consume work until shutdown.
    /// On exit the worker is marked offline; in-flight work finishes
    /// first.
    pub async fn run(self) -> Result<(), BoxError> {
        self.register().await?;

        let tasks = self.shutdown.child_token();
        let heartbeat = tokio::spawn(heartbeat_loop(
            self.pool.clone(),
            self.name.clone(),
            self.heartbeat_interval,
            tasks.clone(),
        ));

        tracing::info!(
            worker_name = %self.name,
            specializations = ?self.specializations,
            heartbeat_secs = self.heartbeat_interval.as_secs(),
            prefetch = self.prefetch,
            "kitchen worker started"
        );

        let result = self.consume_loop().await;

        tasks.cancel();
        let _ = heartbeat.await;

        if let Err(e) = db::workers::set_status(&self.pool, &self.name, "offline").await {
            tracing::error!(error = %e, worker_name = %self.name, "failed to mark worker offline");
        } else {
            tracing::info!(worker_name = %self.name, "worker marked offline");
        }

        result
    }

    /// Startup registration. A same-named worker already online is a
    /// fatal conflict.
    async fn register(&self) -> Result<(), ServiceError> {
        let online = db::workers::count_online(&self.pool, &self.name).await?;
        if online > 0 {
            return Err(AppError::with_message(
                ErrorCode::WorkerAlreadyOnline,
                format!("worker {} is already online", self.name),
            )
            .into());
        }

        let worker_id =
            db::workers::register(&self.pool, &self.name, &worker_type_label(&self.specializations))
                .await?;
        tracing::info!(worker_id, worker_name = %self.name, "worker registered");
        Ok(())
    }

    /// Consume the queue matching this worker's specializations,
    /// re-declaring topology and resuming after broker failures.
    async fn consume_loop(&self) -> Result<(), BoxError> {
        loop {
            let consumer = match topology::work_consumer(&self.context, &self.specializations).await
            {
                Ok(consumer) => consumer,
                Err(e) => {
                    if self.shutdown.is_cancelled() {
                        return Ok(());
                    }
                    tracing::error!(error = %e, "failed to open work consumer, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            let result = run_consumer(
                consumer,
                self.prefetch,
                self.config.operation_timeout,
                self.shutdown.clone(),
                |payload| self.handle_message(payload),
            )
            .await;

            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            if let Err(e) = result {
                tracing::error!(error = %e, "work consumer failed, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
            if let Err(e) = topology::declare(&self.context, self.config.message_ttl).await {
                tracing::error!(error = %e, "topology re-declaration failed");
            }
        }
    }

    /// Process one delivery end to end.
    async fn handle_message(&self, payload: Bytes) -> HandlerOutcome {
        let request_id = Uuid::new_v4();

        let work: WorkMessage = match serde_json::from_slice(&payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(error = %e, %request_id, "unparseable work message, dropping");
                return HandlerOutcome::PermanentFailure;
            }
        };

        if !can_handle(&self.specializations, work.order_type) {
            tracing::debug!(
                order_number = %work.order_number,
                order_type = %work.order_type,
                specializations = ?self.specializations,
                "order type outside specialization, requeueing"
            );
            return HandlerOutcome::RetryableFailure;
        }

        match self.process_order(&work, request_id).await {
            Ok(()) => HandlerOutcome::Completed,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    order_number = %work.order_number,
                    %request_id,
                    "order processing failed, requeueing"
                );
                HandlerOutcome::RetryableFailure
            }
        }
    }

    async fn process_order(&self, work: &WorkMessage, request_id: Uuid) -> Result<(), ServiceError> {
        let Some(_order_id) = self.mark_cooking(&work.order_number).await? else {
            tracing::info!(
                order_number = %work.order_number,
                %request_id,
                "order already advanced past received, completing redelivery as no-op"
            );
            return Ok(());
        };

        let prep = self.config.prep_time(work.order_type);
        let estimated_completion = Utc::now()
            + chrono::Duration::from_std(prep).unwrap_or_else(|_| chrono::Duration::seconds(0));
        self.notify(StatusNotification::new(
            work.order_number.clone(),
            OrderStatus::Received,
            OrderStatus::Cooking,
            self.name.clone(),
            Some(estimated_completion),
        ))
        .await;

        tracing::debug!(
            order_number = %work.order_number,
            prep_secs = prep.as_secs(),
            "cooking order"
        );
        tokio::time::sleep(prep).await;

        if !self.mark_ready(&work.order_number).await? {
            tracing::info!(
                order_number = %work.order_number,
                %request_id,
                "order already advanced past cooking, skipping ready transition"
            );
            return Ok(());
        }

        self.notify(StatusNotification::new(
            work.order_number.clone(),
            OrderStatus::Cooking,
            OrderStatus::Ready,
            self.name.clone(),
            None,
        ))
        .await;

        tracing::info!(
            order_number = %work.order_number,
            processed_by = %self.name,
            "order ready"
        );
        Ok(())
    }

    /// Transition `received → cooking` with its status-log row in one
    /// transaction. `None` means the order already advanced.
    async fn mark_cooking(&self, order_number: &str) -> Result<Option<i64>, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let Some(order_id) =
            db::orders::transition_to_cooking(&mut *tx, order_number, &self.name).await?
        else {
            return Ok(None);
        };
        db::orders::insert_status_log(
            &mut *tx,
            order_id,
            OrderStatus::Cooking,
            &self.name,
            &format!("Order status changed to cooking by {}", self.name),
        )
        .await?;
        tx.commit().await?;
        Ok(Some(order_id))
    }

    /// Transition `cooking → ready`, stamp completion, and increment
    /// the processed counter in one transaction. `false` means the
    /// order already advanced.
    async fn mark_ready(&self, order_number: &str) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let Some(order_id) = db::orders::transition_to_ready(&mut *tx, order_number).await? else {
            return Ok(false);
        };
        db::orders::insert_status_log(
            &mut *tx,
            order_id,
            OrderStatus::Ready,
            &self.name,
            "Order completed and ready for pickup/delivery",
        )
        .await?;
        db::workers::increment_processed(&mut *tx, &self.name).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Notifications are best-effort and never fail order progression.
    async fn notify(&self, notification: StatusNotification) {
        if let Err(e) = self.publisher.publish_notification(&notification).await {
            tracing::error!(
                error = %e,
                order_number = %notification.order_number,
                new_status = %notification.new_status,
                "failed to publish status notification"
            );
        }
    }
}

/// Empty specialization set means "handle all types".
fn can_handle(specializations: &[OrderType], order_type: OrderType) -> bool {
    specializations.is_empty() || specializations.contains(&order_type)
}

/// Persisted worker type: joined specializations, or `general`.
fn worker_type_label(specializations: &[OrderType]) -> String {
    if specializations.is_empty() {
        "general".to_string()
    } else {
        specializations
            .iter()
            .map(OrderType::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Periodic liveness signal, decoupled from message processing so a
/// worker busy cooking still reports liveness.
async fn heartbeat_loop(
    pool: PgPool,
    name: String,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // skip immediate tick
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = ticker.tick() => {
                match db::workers::set_status(&pool, &name, "online").await {
                    Ok(()) => tracing::debug!(worker_name = %name, "heartbeat sent"),
                    Err(e) => tracing::error!(error = %e, worker_name = %name, "heartbeat failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unspecialized_worker_handles_everything() {
        for order_type in OrderType::ALL {
            assert!(can_handle(&[], order_type));
        }
    }

    #[test]
    fn test_specialized_worker_rejects_other_types() {
        let specializations = [OrderType::Takeout];
        assert!(can_handle(&specializations, OrderType::Takeout));
        assert!(!can_handle(&specializations, OrderType::Delivery));
        assert!(!can_handle(&specializations, OrderType::DineIn));
    }

    #[test]
    fn test_worker_type_label() {
        assert_eq!(worker_type_label(&[]), "general");
        assert_eq!(worker_type_label(&[OrderType::DineIn]), "dine_in");
        assert_eq!(
            worker_type_label(&[OrderType::DineIn, OrderType::Takeout]),
            "dine_in,takeout"
        );
    }
}
