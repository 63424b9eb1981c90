//! Unified error codes for the Brigade services
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 8xxx: Worker errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient
/// serialization and cross-service compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed from the current status
    InvalidStatusTransition = 4002,

    // ==================== 8xxx: Worker ====================
    /// A worker with the same name is already online
    WorkerAlreadyOnline = 8001,
    /// Worker not found
    WorkerNotFound = 8002,
    /// Worker cannot handle the order type of this message
    UnhandledOrderType = 8003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Broker publish/consume error
    MessagingError = 9003,
    /// Operation exceeded its deadline
    Timeout = 9004,
    /// Dependency unavailable
    ServiceUnavailable = 9005,
}

/// High-level error category, used to decide logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    General,
    Order,
    Worker,
    System,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Invalid order status transition",
            ErrorCode::WorkerAlreadyOnline => "Worker with the same name is already online",
            ErrorCode::WorkerNotFound => "Worker not found",
            ErrorCode::UnhandledOrderType => "Worker cannot handle this order type",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::MessagingError => "Messaging error",
            ErrorCode::Timeout => "Operation timed out",
            ErrorCode::ServiceUnavailable => "Service unavailable",
        }
    }

    /// Numeric code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Category of this code
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            0..=999 => ErrorCategory::General,
            4000..=4999 => ErrorCategory::Order,
            8000..=8999 => ErrorCategory::Worker,
            _ => ErrorCategory::System,
        }
    }

    /// HTTP status code this error maps to
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound | ErrorCode::OrderNotFound | ErrorCode::WorkerNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::WorkerAlreadyOnline | ErrorCode::InvalidStatusTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::Timeout | ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            5 => Ok(ErrorCode::InvalidRequest),
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidStatusTransition),
            8001 => Ok(ErrorCode::WorkerAlreadyOnline),
            8002 => Ok(ErrorCode::WorkerNotFound),
            8003 => Ok(ErrorCode::UnhandledOrderType),
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::MessagingError),
            9004 => Ok(ErrorCode::Timeout),
            9005 => Ok(ErrorCode::ServiceUnavailable),
            _ => Err(format!("unknown error code: {value}")),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::OrderNotFound,
            ErrorCode::WorkerAlreadyOnline,
            ErrorCode::Timeout,
        ] {
            let n: u16 = code.into();
            assert_eq!(ErrorCode::try_from(n), Ok(code));
        }
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::WorkerAlreadyOnline.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::Timeout.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(ErrorCode::NotFound.category(), ErrorCategory::General);
        assert_eq!(ErrorCode::OrderNotFound.category(), ErrorCategory::Order);
        assert_eq!(
            ErrorCode::WorkerAlreadyOnline.category(),
            ErrorCategory::Worker
        );
        assert_eq!(ErrorCode::MessagingError.category(), ErrorCategory::System);
    }
}
