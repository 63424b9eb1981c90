//! Notification relay: renders status events for observers
//!
//! Every relay instance subscribes with its own consumer group on the
//! notification stream, so each instance independently receives every
//! event (fanout semantics).

use async_nats::jetstream;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use shared::message::StatusNotification;
use shared::models::OrderStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::messaging::{HandlerOutcome, run_consumer, topology};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Delay before rebuilding the consumer after a broker failure
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct NotificationRelay {
    group: String,
    context: jetstream::Context,
    config: Arc<Config>,
    shutdown: CancellationToken,
}

impl NotificationRelay {
    pub fn new(
        group: String,
        context: jetstream::Context,
        config: Arc<Config>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            group,
            context,
            config,
            shutdown,
        }
    }

    /// Consume notifications until shutdown, reconnecting after broker
    /// failures.
    pub async fn run(self) -> Result<(), BoxError> {
        tracing::info!(group = %self.group, "notification relay started");
        loop {
            let consumer =
                match topology::notification_consumer(&self.context, &self.group).await {
                    Ok(consumer) => consumer,
                    Err(e) => {
                        if self.shutdown.is_cancelled() {
                            return Ok(());
                        }
                        tracing::error!(error = %e, "failed to open notification consumer, retrying");
                        tokio::time::sleep(RECONNECT_DELAY).await;
                        continue;
                    }
                };

            let result = run_consumer(
                consumer,
                1,
                self.config.operation_timeout,
                self.shutdown.clone(),
                |payload| async move { handle_notification(payload) },
            )
            .await;

            if self.shutdown.is_cancelled() {
                return Ok(());
            }
            if let Err(e) = result {
                tracing::error!(error = %e, "notification consumer failed, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
            if let Err(e) = topology::declare(&self.context, self.config.message_ttl).await {
                tracing::error!(error = %e, "topology re-declaration failed");
            }
        }
    }
}

fn handle_notification(payload: Bytes) -> HandlerOutcome {
    let notification: StatusNotification = match serde_json::from_slice(&payload) {
        Ok(notification) => notification,
        Err(e) => {
            tracing::error!(error = %e, "unparseable notification, dropping");
            return HandlerOutcome::PermanentFailure;
        }
    };

    println!("{}", format_notification(&notification));
    tracing::info!(
        order_number = %notification.order_number,
        old_status = %notification.old_status,
        new_status = %notification.new_status,
        changed_by = %notification.changed_by,
        "notification displayed"
    );
    HandlerOutcome::Completed
}

/// Human-readable line for a status event, selected by the new status.
fn format_notification(notification: &StatusNotification) -> String {
    let timestamp = notification.timestamp.format("%Y-%m-%d %H:%M:%S");
    match notification.new_status {
        OrderStatus::Cooking => match notification.estimated_completion {
            Some(eta) => format!(
                "🍳 [{timestamp}] Order {} is now being prepared by {}. Estimated completion: {}",
                notification.order_number,
                notification.changed_by,
                format_eta(eta),
            ),
            None => format!(
                "🍳 [{timestamp}] Order {} is now being prepared by {}.",
                notification.order_number, notification.changed_by,
            ),
        },
        OrderStatus::Ready => format!(
            "✅ [{timestamp}] Order {} is ready for pickup/delivery! Prepared by {}.",
            notification.order_number, notification.changed_by,
        ),
        OrderStatus::Completed => format!(
            "🎉 [{timestamp}] Order {} has been completed and delivered! Thank you for your business.",
            notification.order_number,
        ),
        OrderStatus::Cancelled => format!(
            "❌ [{timestamp}] Order {} has been cancelled.",
            notification.order_number,
        ),
        _ => format!(
            "📋 [{timestamp}] Order {} status changed from '{}' to '{}' by {}.",
            notification.order_number,
            notification.old_status,
            notification.new_status,
            notification.changed_by,
        ),
    }
}

fn format_eta(eta: DateTime<Utc>) -> String {
    eta.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(new_status: OrderStatus, eta: Option<DateTime<Utc>>) -> StatusNotification {
        StatusNotification::new(
            "ORD_20260807_001",
            OrderStatus::Received,
            new_status,
            "chef_mario",
            eta,
        )
    }

    #[test]
    fn test_cooking_line_includes_estimate() {
        let eta = Utc::now() + chrono::Duration::seconds(8);
        let line = format_notification(&notification(OrderStatus::Cooking, Some(eta)));
        assert!(line.starts_with("🍳"));
        assert!(line.contains("ORD_20260807_001"));
        assert!(line.contains("chef_mario"));
        assert!(line.contains("Estimated completion:"));
    }

    #[test]
    fn test_ready_line() {
        let line = format_notification(&notification(OrderStatus::Ready, None));
        assert!(line.starts_with("✅"));
        assert!(line.contains("ready for pickup/delivery"));
        assert!(line.contains("chef_mario"));
    }

    #[test]
    fn test_completed_line() {
        let line = format_notification(&notification(OrderStatus::Completed, None));
        assert!(line.starts_with("🎉"));
    }

    #[test]
    fn test_cancelled_line() {
        let line = format_notification(&notification(OrderStatus::Cancelled, None));
        assert!(line.starts_with("❌"));
    }

    #[test]
    fn test_fallback_line() {
        let line = format_notification(&notification(OrderStatus::Received, None));
        assert!(line.starts_with("📋"));
        assert!(line.contains("'received'"));
    }
}
