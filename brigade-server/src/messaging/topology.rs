//! JetStream topology for work distribution and notification fanout
//!
//! Two streams play the role of the two exchanges:
//!
//! - `ORDERS_WORK` captures every `kitchen.<type>.<priority>` subject
//!   with a bounded message TTL (`max_age`); expired work is discarded
//!   (no dead-letter target). The durable pull consumers on it are the
//!   bound work queues: each consumer keeps its own cursor, so a
//!   message reaches every queue whose filter matches, like queues
//!   bound to a topic exchange.
//! - `ORDER_NOTIFICATIONS` holds status events; every consumer group
//!   declares its own durable consumer and therefore receives every
//!   notification (fanout semantics).
//!
//! All declarations are `get_or_create` and safe to repeat on every
//! reconnect.

use async_nats::jetstream::{self, consumer, stream};
use shared::models::OrderType;
use std::time::Duration;

pub const WORK_STREAM: &str = "ORDERS_WORK";
pub const WORK_SUBJECTS: &str = "kitchen.>";
pub const GENERAL_WORK_QUEUE: &str = "kitchen_queue";

pub const NOTIFICATION_STREAM: &str = "ORDER_NOTIFICATIONS";
pub const NOTIFICATION_SUBJECT: &str = "orders.notifications";

/// Deadline before an unacknowledged delivery is redelivered
const ACK_WAIT: Duration = Duration::from_secs(30);
/// Upper bound of outstanding unacknowledged deliveries per queue
const MAX_ACK_PENDING: i64 = 64;

/// Name of the per-type work queue
pub fn work_queue_name(order_type: OrderType) -> String {
    format!("kitchen_{order_type}_queue")
}

/// Subject filter of the per-type work queue
pub fn work_queue_filter(order_type: OrderType) -> String {
    format!("kitchen.{order_type}.*")
}

/// Queue a worker consumes, derived from its specialization set:
/// exactly one specialization selects that type's queue, none or
/// several select the general queue (which covers the whole kitchen
/// subject space).
pub fn queue_for_specializations(specializations: &[OrderType]) -> (String, String) {
    match specializations {
        [only] => (work_queue_name(*only), work_queue_filter(*only)),
        _ => (GENERAL_WORK_QUEUE.to_string(), WORK_SUBJECTS.to_string()),
    }
}

/// Declare both streams and every work queue. Idempotent.
pub async fn declare(
    context: &jetstream::Context,
    message_ttl: Duration,
) -> Result<(), async_nats::Error> {
    let work = context
        .get_or_create_stream(stream::Config {
            name: WORK_STREAM.to_string(),
            subjects: vec![WORK_SUBJECTS.to_string()],
            max_age: message_ttl,
            ..Default::default()
        })
        .await?;

    declare_queue(&work, GENERAL_WORK_QUEUE, WORK_SUBJECTS).await?;
    for order_type in OrderType::ALL {
        declare_queue(&work, &work_queue_name(order_type), &work_queue_filter(order_type)).await?;
    }

    context
        .get_or_create_stream(stream::Config {
            name: NOTIFICATION_STREAM.to_string(),
            subjects: vec![NOTIFICATION_SUBJECT.to_string()],
            ..Default::default()
        })
        .await?;

    Ok(())
}

/// Durable pull consumer for the queue matching the given
/// specialization set.
pub async fn work_consumer(
    context: &jetstream::Context,
    specializations: &[OrderType],
) -> Result<consumer::PullConsumer, async_nats::Error> {
    let (queue, filter) = queue_for_specializations(specializations);
    let stream = context.get_stream(WORK_STREAM).await?;
    let consumer = declare_queue(&stream, &queue, &filter).await?;
    Ok(consumer)
}

/// Durable pull consumer for a notification consumer group. Every
/// group sees every notification.
pub async fn notification_consumer(
    context: &jetstream::Context,
    group: &str,
) -> Result<consumer::PullConsumer, async_nats::Error> {
    let stream = context.get_stream(NOTIFICATION_STREAM).await?;
    let consumer = stream
        .get_or_create_consumer(
            group,
            consumer::pull::Config {
                durable_name: Some(group.to_string()),
                ack_policy: consumer::AckPolicy::Explicit,
                ack_wait: ACK_WAIT,
                max_ack_pending: MAX_ACK_PENDING,
                ..Default::default()
            },
        )
        .await?;
    Ok(consumer)
}

async fn declare_queue(
    stream: &stream::Stream,
    name: &str,
    filter: &str,
) -> Result<consumer::PullConsumer, async_nats::Error> {
    let consumer = stream
        .get_or_create_consumer(
            name,
            consumer::pull::Config {
                durable_name: Some(name.to_string()),
                filter_subject: filter.to_string(),
                ack_policy: consumer::AckPolicy::Explicit,
                ack_wait: ACK_WAIT,
                max_ack_pending: MAX_ACK_PENDING,
                ..Default::default()
            },
        )
        .await?;
    Ok(consumer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_queue_names() {
        assert_eq!(work_queue_name(OrderType::DineIn), "kitchen_dine_in_queue");
        assert_eq!(work_queue_filter(OrderType::Delivery), "kitchen.delivery.*");
    }

    #[test]
    fn test_single_specialization_selects_typed_queue() {
        let (queue, filter) = queue_for_specializations(&[OrderType::Takeout]);
        assert_eq!(queue, "kitchen_takeout_queue");
        assert_eq!(filter, "kitchen.takeout.*");
    }

    #[test]
    fn test_unspecialized_selects_general_queue() {
        let (queue, filter) = queue_for_specializations(&[]);
        assert_eq!(queue, GENERAL_WORK_QUEUE);
        assert_eq!(filter, WORK_SUBJECTS);
    }

    #[test]
    fn test_multi_specialization_selects_general_queue() {
        let (queue, _) = queue_for_specializations(&[OrderType::DineIn, OrderType::Takeout]);
        assert_eq!(queue, GENERAL_WORK_QUEUE);
    }

    #[test]
    fn test_typed_filters_match_routing_keys() {
        // the per-type filter must match what intake publishes
        let key = shared::message::routing_key(OrderType::Delivery, 10);
        let filter = work_queue_filter(OrderType::Delivery);
        let filter_prefix = filter.trim_end_matches('*');
        assert!(key.starts_with(filter_prefix));
        assert_eq!(key.split('.').count(), filter.split('.').count());
    }
}
