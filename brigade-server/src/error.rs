//! Unified service-layer error type
//!
//! `ServiceError` bridges the gap between infrastructure errors
//! (`sqlx::Error`, broker errors) and the application error
//! (`shared::AppError`). It enables `?` propagation without manual
//! `.map_err(|e| { tracing::error!(...); AppError::internal(...) })`
//! boilerplate.

use shared::error::{AppError, ErrorCode};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service-layer error — only two variants, keeps things simple.
///
/// - `Infra`: Database/broker/serde errors (auto-logged, mapped to a
///   generic internal error so no detail leaks to callers)
/// - `App`: Business-rule errors (transparent pass-through to client)
#[derive(Debug)]
pub enum ServiceError {
    /// Infrastructure error (sqlx, async-nats, serde, etc.)
    Infra(BoxError),
    /// Business-rule error (already an AppError with the correct ErrorCode)
    App(AppError),
}

impl ServiceError {
    /// True when the underlying failure is a Postgres unique-constraint
    /// violation, used by intake to retry order-number collisions.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            ServiceError::Infra(err) => err
                .downcast_ref::<sqlx::Error>()
                .and_then(|e| e.as_database_error())
                .is_some_and(|db| db.is_unique_violation()),
            ServiceError::App(_) => false,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Infra(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Infra(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Infra(infra_err) => {
                tracing::error!(error = %infra_err, "service infrastructure error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Infra(e) => write!(f, "{e}"),
            ServiceError::App(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
