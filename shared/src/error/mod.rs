//! Unified error module for the Brigade services
//!
//! Error codes are shared across all service modes so that the order
//! API, the tracking API, and the worker runtimes report failures in a
//! consistent vocabulary.

pub mod codes;
pub mod types;

pub use codes::{ErrorCategory, ErrorCode};
pub use types::{AppError, AppResult};
