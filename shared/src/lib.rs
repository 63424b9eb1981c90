//! Shared types for the Brigade order-fulfillment pipeline
//!
//! Common types used by every service mode: domain models, broker
//! message envelopes, and the unified error module.

pub mod error;
pub mod message;
pub mod models;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

// Error re-exports (for convenient access)
pub use error::{AppError, AppResult, ErrorCode};

// Message re-exports
pub use message::{StatusNotification, WorkMessage};
