//! Message publishing

use async_nats::jetstream;
use shared::message::{StatusNotification, WorkMessage};

use super::topology::NOTIFICATION_SUBJECT;

/// Publishes work and notification messages, waiting for the broker
/// acknowledgement of each publish.
#[derive(Clone)]
pub struct Publisher {
    context: jetstream::Context,
}

impl Publisher {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }

    /// Publish a work message under its `kitchen.<type>.<priority>`
    /// routing subject.
    pub async fn publish_work(&self, message: &WorkMessage) -> Result<(), async_nats::Error> {
        let subject = message.routing_key();
        let payload = serde_json::to_vec(message)?;
        self.context
            .publish(subject.clone(), payload.into())
            .await?
            .await?;
        tracing::debug!(
            order_number = %message.order_number,
            routing_key = %subject,
            "work message published"
        );
        Ok(())
    }

    /// Broadcast a status notification to every consumer group.
    pub async fn publish_notification(
        &self,
        notification: &StatusNotification,
    ) -> Result<(), async_nats::Error> {
        let payload = serde_json::to_vec(notification)?;
        self.context
            .publish(NOTIFICATION_SUBJECT, payload.into())
            .await?
            .await?;
        tracing::debug!(
            order_number = %notification.order_number,
            new_status = %notification.new_status,
            "status notification published"
        );
        Ok(())
    }
}
