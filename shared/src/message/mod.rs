//! Broker message envelopes
//!
//! Both envelopes are serialized as JSON. `WorkMessage` travels on the
//! work stream under a `kitchen.<order_type>.<priority>` routing
//! subject; `StatusNotification` is broadcast to every notification
//! consumer group.

use crate::models::{OrderItem, OrderStatus, OrderType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Work dispatched to the kitchen after an order is durably persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkMessage {
    pub order_number: String,
    pub customer_name: String,
    pub order_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub priority: i32,
}

impl WorkMessage {
    /// Routing subject for this message: `kitchen.<order_type>.<priority>`
    pub fn routing_key(&self) -> String {
        routing_key(self.order_type, self.priority)
    }
}

/// Routing subject for work messages
pub fn routing_key(order_type: OrderType, priority: i32) -> String {
    format!("kitchen.{order_type}.{priority}")
}

/// Status-change event broadcast to every notification consumer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusNotification {
    pub order_number: String,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
}

impl StatusNotification {
    pub fn new(
        order_number: impl Into<String>,
        old_status: OrderStatus,
        new_status: OrderStatus,
        changed_by: impl Into<String>,
        estimated_completion: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            order_number: order_number.into(),
            old_status,
            new_status,
            changed_by: changed_by.into(),
            timestamp: Utc::now(),
            estimated_completion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_routing_key_format() {
        assert_eq!(routing_key(OrderType::DineIn, 10), "kitchen.dine_in.10");
        assert_eq!(routing_key(OrderType::Takeout, 1), "kitchen.takeout.1");
        assert_eq!(routing_key(OrderType::Delivery, 5), "kitchen.delivery.5");
    }

    #[test]
    fn test_work_message_roundtrip() {
        let msg = WorkMessage {
            order_number: "ORD_20260807_001".to_string(),
            customer_name: "Jane Smith".to_string(),
            order_type: OrderType::Delivery,
            table_number: None,
            delivery_address: Some("123 Main Street".to_string()),
            items: vec![OrderItem {
                name: "Pizza".to_string(),
                quantity: 2,
                price: dec!(10.00),
            }],
            total_amount: dec!(20.00),
            priority: 1,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"order_type\":\"delivery\""));
        // absent optional fields are omitted from the wire form
        assert!(!json.contains("table_number"));

        let parsed: WorkMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.order_number, msg.order_number);
        assert_eq!(parsed.total_amount, dec!(20.00));
        assert_eq!(parsed.routing_key(), "kitchen.delivery.1");
    }

    #[test]
    fn test_notification_omits_missing_estimate() {
        let note = StatusNotification::new(
            "ORD_20260807_001",
            OrderStatus::Cooking,
            OrderStatus::Ready,
            "chef_mario",
            None,
        );
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["new_status"], "ready");
        assert!(json.get("estimated_completion").is_none());
    }

    #[test]
    fn test_notification_carries_estimate_while_cooking() {
        let eta = Utc::now() + chrono::Duration::seconds(8);
        let note = StatusNotification::new(
            "ORD_20260807_001",
            OrderStatus::Received,
            OrderStatus::Cooking,
            "chef_mario",
            Some(eta),
        );
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["old_status"], "received");
        assert!(json.get("estimated_completion").is_some());
    }
}
