//! Service configuration, loaded from the environment

use shared::models::OrderType;
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Runtime configuration shared by every service mode
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// NATS server URL
    pub nats_url: String,
    /// Time-to-live for undelivered work messages
    pub message_ttl: Duration,
    /// Deadline for a single HTTP request or consumed message
    pub operation_timeout: Duration,
    /// Worker heartbeat interval; the tracking roster reports a worker
    /// offline once `last_seen` is older than twice this value
    pub heartbeat_interval: Duration,
    /// Preparation durations per order type
    pub prep_dine_in: Duration,
    pub prep_takeout: Duration,
    pub prep_delivery: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            nats_url: std::env::var("NATS_URL")
                .unwrap_or_else(|_| "nats://127.0.0.1:4222".into()),
            message_ttl: duration_from_env("MESSAGE_TTL_SECS", 300),
            operation_timeout: duration_from_env("OPERATION_TIMEOUT_SECS", 30),
            heartbeat_interval: duration_from_env("HEARTBEAT_INTERVAL_SECS", 30),
            prep_dine_in: prep_from_env("PREP_DINE_IN_SECS", OrderType::DineIn),
            prep_takeout: prep_from_env("PREP_TAKEOUT_SECS", OrderType::Takeout),
            prep_delivery: prep_from_env("PREP_DELIVERY_SECS", OrderType::Delivery),
        })
    }

    /// Preparation duration for an order type
    pub fn prep_time(&self, order_type: OrderType) -> Duration {
        match order_type {
            OrderType::DineIn => self.prep_dine_in,
            OrderType::Takeout => self.prep_takeout,
            OrderType::Delivery => self.prep_delivery,
        }
    }
}

fn duration_from_env(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default_secs),
    )
}

fn prep_from_env(name: &str, order_type: OrderType) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| order_type.default_prep_time())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/brigade".into(),
            nats_url: "nats://127.0.0.1:4222".into(),
            message_ttl: Duration::from_secs(300),
            operation_timeout: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(30),
            prep_dine_in: OrderType::DineIn.default_prep_time(),
            prep_takeout: OrderType::Takeout.default_prep_time(),
            prep_delivery: OrderType::Delivery.default_prep_time(),
        }
    }

    #[test]
    fn test_prep_time_per_type() {
        let config = base_config();
        assert_eq!(config.prep_time(OrderType::DineIn), Duration::from_secs(8));
        assert_eq!(config.prep_time(OrderType::Takeout), Duration::from_secs(10));
        assert_eq!(config.prep_time(OrderType::Delivery), Duration::from_secs(12));
    }
}
