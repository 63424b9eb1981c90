//! Order domain model: types, statuses, request validation, derived fields

use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Kind of customer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
}

impl OrderType {
    pub const ALL: [OrderType; 3] = [OrderType::DineIn, OrderType::Takeout, OrderType::Delivery];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine_in",
            OrderType::Takeout => "takeout",
            OrderType::Delivery => "delivery",
        }
    }

    /// Default preparation duration for this order type
    pub fn default_prep_time(&self) -> Duration {
        match self {
            OrderType::DineIn => Duration::from_secs(8),
            OrderType::Takeout => Duration::from_secs(10),
            OrderType::Delivery => Duration::from_secs(12),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dine_in" => Ok(OrderType::DineIn),
            "takeout" => Ok(OrderType::Takeout),
            "delivery" => Ok(OrderType::Delivery),
            _ => Err(AppError::validation(
                "order_type",
                "order_type must be one of: dine_in, takeout, delivery",
            )),
        }
    }
}

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Received,
    Cooking,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Received => "received",
            OrderStatus::Cooking => "cooking",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Transition legality: `received → cooking → ready → completed`,
    /// with `cancelled` reachable from any non-terminal state. No skips,
    /// no reversals.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if next == OrderStatus::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (OrderStatus::Received, OrderStatus::Cooking)
                | (OrderStatus::Cooking, OrderStatus::Ready)
                | (OrderStatus::Ready, OrderStatus::Completed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(OrderStatus::Received),
            "cooking" => Ok(OrderStatus::Cooking),
            "ready" => Ok(OrderStatus::Ready),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(AppError::invalid_request(format!("unknown order status: {s}"))),
        }
    }
}

/// Single line item of an order; immutable once persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Request body of `POST /orders`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub order_type: String,
    #[serde(default)]
    pub table_number: Option<i32>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Response body of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// One row of the append-only status audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusEntry {
    pub status: OrderStatus,
    pub changed_by: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Response body of `GET /orders/{number}/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTrackingResponse {
    pub order_number: String,
    pub current_status: OrderStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

impl CreateOrderRequest {
    /// Validate the request, returning a field-level error on the first
    /// violation.
    pub fn validate(&self) -> Result<OrderType, AppError> {
        validate_customer_name(&self.customer_name)?;
        let order_type = OrderType::from_str(&self.order_type)?;
        validate_conditional_fields(order_type, self.table_number, self.delivery_address.as_deref())?;
        validate_items(&self.items)?;
        Ok(order_type)
    }

    /// Sum of `price × quantity` over all items
    pub fn total_amount(&self) -> Decimal {
        order_total(&self.items)
    }
}

/// Sum of `price × quantity` over all items
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum()
}

/// Priority tier derived from the order total: 10 above 100, 5 in
/// [50, 100], 1 below.
pub fn priority_for_total(total: Decimal) -> i32 {
    if total > Decimal::from(100) {
        10
    } else if total >= Decimal::from(50) {
        5
    } else {
        1
    }
}

/// Format a daily-unique order number as `ORD_YYYYMMDD_NNN`
pub fn format_order_number(date: NaiveDate, sequence: u32) -> String {
    format!("ORD_{}_{:03}", date.format("%Y%m%d"), sequence)
}

fn validate_customer_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::validation("customer_name", "customer_name is required"));
    }
    if name.len() > 100 {
        return Err(AppError::validation(
            "customer_name",
            "customer_name must not exceed 100 characters",
        ));
    }
    let valid = name
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_ascii_whitespace() || c == '-' || c == '\'');
    if !valid {
        return Err(AppError::validation(
            "customer_name",
            "customer_name contains invalid characters",
        ));
    }
    Ok(())
}

fn validate_conditional_fields(
    order_type: OrderType,
    table_number: Option<i32>,
    delivery_address: Option<&str>,
) -> Result<(), AppError> {
    match order_type {
        OrderType::DineIn => {
            let table = table_number.ok_or_else(|| {
                AppError::validation("table_number", "table_number is required for dine_in orders")
            })?;
            if !(1..=100).contains(&table) {
                return Err(AppError::validation(
                    "table_number",
                    "table_number must be between 1 and 100",
                ));
            }
            if delivery_address.is_some() {
                return Err(AppError::validation(
                    "delivery_address",
                    "delivery_address must not be present for dine_in orders",
                ));
            }
        }
        OrderType::Delivery => {
            let address = delivery_address.ok_or_else(|| {
                AppError::validation(
                    "delivery_address",
                    "delivery_address is required for delivery orders",
                )
            })?;
            if address.len() < 10 {
                return Err(AppError::validation(
                    "delivery_address",
                    "delivery_address must be at least 10 characters",
                ));
            }
            if table_number.is_some() {
                return Err(AppError::validation(
                    "table_number",
                    "table_number must not be present for delivery orders",
                ));
            }
        }
        OrderType::Takeout => {
            if table_number.is_some() {
                return Err(AppError::validation(
                    "table_number",
                    "table_number must not be present for takeout orders",
                ));
            }
            if delivery_address.is_some() {
                return Err(AppError::validation(
                    "delivery_address",
                    "delivery_address must not be present for takeout orders",
                ));
            }
        }
    }
    Ok(())
}

fn validate_items(items: &[OrderItem]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::validation("items", "items array cannot be empty"));
    }
    if items.len() > 20 {
        return Err(AppError::validation(
            "items",
            "items array cannot contain more than 20 items",
        ));
    }
    for (index, item) in items.iter().enumerate() {
        let prefix = format!("items[{index}]");
        if item.name.is_empty() {
            return Err(AppError::validation(
                format!("{prefix}.name"),
                format!("{prefix}.name is required"),
            ));
        }
        if item.name.len() > 50 {
            return Err(AppError::validation(
                format!("{prefix}.name"),
                format!("{prefix}.name must not exceed 50 characters"),
            ));
        }
        if !(1..=10).contains(&item.quantity) {
            return Err(AppError::validation(
                format!("{prefix}.quantity"),
                format!("{prefix}.quantity must be between 1 and 10"),
            ));
        }
        if item.price < Decimal::new(1, 2) || item.price > Decimal::new(99999, 2) {
            return Err(AppError::validation(
                format!("{prefix}.price"),
                format!("{prefix}.price must be between 0.01 and 999.99"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(name: &str, quantity: i32, price: Decimal) -> OrderItem {
        OrderItem {
            name: name.to_string(),
            quantity,
            price,
        }
    }

    fn delivery_request() -> CreateOrderRequest {
        CreateOrderRequest {
            customer_name: "Jane Smith".to_string(),
            order_type: "delivery".to_string(),
            table_number: None,
            delivery_address: Some("123 Main Street".to_string()),
            items: vec![item("Pizza", 2, dec!(10.00))],
        }
    }

    #[test]
    fn test_total_amount() {
        let req = delivery_request();
        assert_eq!(req.total_amount(), dec!(20.00));
    }

    #[test]
    fn test_priority_boundaries() {
        assert_eq!(priority_for_total(dec!(49.99)), 1);
        assert_eq!(priority_for_total(dec!(50.00)), 5);
        assert_eq!(priority_for_total(dec!(100.00)), 5);
        assert_eq!(priority_for_total(dec!(100.01)), 10);
    }

    #[test]
    fn test_order_number_format() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        assert_eq!(format_order_number(date, 1), "ORD_20260807_001");
        assert_eq!(format_order_number(date, 42), "ORD_20260807_042");
        assert_eq!(format_order_number(date, 123), "ORD_20260807_123");
    }

    #[test]
    fn test_valid_delivery_request() {
        assert_eq!(delivery_request().validate().unwrap(), OrderType::Delivery);
    }

    #[test]
    fn test_customer_name_rules() {
        let mut req = delivery_request();
        req.customer_name = String::new();
        assert!(req.validate().unwrap_err().message.contains("customer_name"));

        req.customer_name = "x".repeat(101);
        assert!(req.validate().unwrap_err().message.contains("100 characters"));

        req.customer_name = "Jane123".to_string();
        assert!(req.validate().unwrap_err().message.contains("invalid characters"));

        req.customer_name = "O'Brien-Smith".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_unknown_order_type_rejected() {
        let mut req = delivery_request();
        req.order_type = "drive_thru".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.message.starts_with("order_type:"));
    }

    #[test]
    fn test_dine_in_rejects_delivery_address() {
        let req = CreateOrderRequest {
            customer_name: "Jane Smith".to_string(),
            order_type: "dine_in".to_string(),
            table_number: Some(5),
            delivery_address: Some("123 Main Street".to_string()),
            items: vec![item("Pizza", 1, dec!(10.00))],
        };
        let err = req.validate().unwrap_err();
        assert!(err.message.starts_with("delivery_address:"));
    }

    #[test]
    fn test_dine_in_table_range() {
        let mut req = CreateOrderRequest {
            customer_name: "Jane Smith".to_string(),
            order_type: "dine_in".to_string(),
            table_number: Some(0),
            delivery_address: None,
            items: vec![item("Pizza", 1, dec!(10.00))],
        };
        assert!(req.validate().unwrap_err().message.contains("between 1 and 100"));
        req.table_number = Some(101);
        assert!(req.validate().is_err());
        req.table_number = Some(100);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_delivery_rejects_table_number() {
        let mut req = delivery_request();
        req.table_number = Some(3);
        let err = req.validate().unwrap_err();
        assert!(err.message.starts_with("table_number:"));
    }

    #[test]
    fn test_delivery_address_min_length() {
        let mut req = delivery_request();
        req.delivery_address = Some("short".to_string());
        assert!(req.validate().unwrap_err().message.contains("at least 10"));
    }

    #[test]
    fn test_takeout_forbids_both() {
        let mut req = CreateOrderRequest {
            customer_name: "Jane Smith".to_string(),
            order_type: "takeout".to_string(),
            table_number: Some(1),
            delivery_address: None,
            items: vec![item("Pizza", 1, dec!(10.00))],
        };
        assert!(req.validate().unwrap_err().message.starts_with("table_number:"));
        req.table_number = None;
        req.delivery_address = Some("123 Main Street".to_string());
        assert!(req.validate().unwrap_err().message.starts_with("delivery_address:"));
        req.delivery_address = None;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_item_rules() {
        let mut req = delivery_request();
        req.items = vec![];
        assert!(req.validate().unwrap_err().message.contains("empty"));

        req.items = (0..21).map(|_| item("Pizza", 1, dec!(1.00))).collect();
        assert!(req.validate().unwrap_err().message.contains("more than 20"));

        req.items = vec![item("Pizza", 11, dec!(1.00))];
        assert!(req.validate().unwrap_err().message.contains("items[0].quantity"));

        req.items = vec![item("Pizza", 1, dec!(0.00))];
        assert!(req.validate().unwrap_err().message.contains("items[0].price"));

        req.items = vec![item("Pizza", 1, dec!(1000.00))];
        assert!(req.validate().unwrap_err().message.contains("items[0].price"));

        req.items = vec![item("Pizza", 10, dec!(999.99))];
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Received.can_transition_to(Cooking));
        assert!(Cooking.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
        // no skips, no reversals
        assert!(!Received.can_transition_to(Ready));
        assert!(!Cooking.can_transition_to(Received));
        assert!(!Ready.can_transition_to(Cooking));
        // cancelled from any non-terminal state only
        assert!(Received.can_transition_to(Cancelled));
        assert!(Cooking.can_transition_to(Cancelled));
        assert!(Ready.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cooking));
    }

    #[test]
    fn test_default_prep_times() {
        assert_eq!(OrderType::DineIn.default_prep_time(), Duration::from_secs(8));
        assert_eq!(OrderType::Takeout.default_prep_time(), Duration::from_secs(10));
        assert_eq!(OrderType::Delivery.default_prep_time(), Duration::from_secs(12));
    }

    #[test]
    fn test_request_deserialization_rejects_unknown_fields() {
        let body = r#"{"customer_name":"Jane","order_type":"takeout","items":[],"surprise":1}"#;
        assert!(serde_json::from_str::<CreateOrderRequest>(body).is_err());
    }

    #[test]
    fn test_response_serializes_total_as_number() {
        let resp = CreateOrderResponse {
            order_number: "ORD_20260807_001".to_string(),
            status: OrderStatus::Received,
            total_amount: dec!(20.00),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "received");
        assert_eq!(json["total_amount"], 20.0);
    }
}
