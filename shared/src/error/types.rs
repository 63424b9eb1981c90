//! Application error type shared by every service mode

use super::codes::ErrorCode;
use http::StatusCode;
use thiserror::Error;

/// Application error with a structured error code
///
/// The primary error type for Brigade services. Validation errors carry
/// the offending field name as a message prefix so that API consumers
/// can see which field was rejected.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    // ==================== Convenience constructors ====================

    /// Create a field-level validation error (`"<field>: <message>"`)
    pub fn validation(field: impl AsRef<str>, message: impl AsRef<str>) -> Self {
        Self::with_message(
            ErrorCode::ValidationFailed,
            format!("{}: {}", field.as_ref(), message.as_ref()),
        )
    }

    /// Create a not found error
    pub fn not_found(resource: impl AsRef<str>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.as_ref()))
    }

    /// Create an order not found error
    pub fn order_not_found(order_number: impl AsRef<str>) -> Self {
        Self::with_message(
            ErrorCode::OrderNotFound,
            format!("order {} not found", order_number.as_ref()),
        )
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, message)
    }

    /// Create a messaging error
    pub fn messaging(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::MessagingError, message)
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::Timeout, message)
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, message)
    }

    /// True when this error is client-caused (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
    }

    #[test]
    fn test_validation_error_names_field() {
        let err = AppError::validation("customer_name", "customer_name is required");
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.starts_with("customer_name:"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_order_not_found() {
        let err = AppError::order_not_found("ORD_20260101_001");
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "order ORD_20260101_001 not found");
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        assert!(!AppError::database("connection reset").is_client_error());
        assert!(!AppError::messaging("broker unreachable").is_client_error());
    }

    #[test]
    fn test_display() {
        let err = AppError::with_message(ErrorCode::OrderNotFound, "order X not found");
        assert_eq!(format!("{err}"), "order X not found");
    }
}
