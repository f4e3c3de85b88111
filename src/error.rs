//! Error types for BarberBot server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Numeric error codes returned in API error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    InvalidService = 5,
    NoWindowConfigured = 6,
    AmbiguousWindow = 7,
    AlreadyCancelled = 8,
    PastAppointment = 9,
    PastTarget = 10,
    InvalidTransition = 11,
    SlotConflict = 12,
    Duplicate = 13,
    BadValue = 14,
    CacheFailure = 15,
    CalendarFailure = 16,
}

/// Main application error type
///
/// The first group of variants is the booking business taxonomy and is returned
/// as-is to callers. `Database`, `Cache`, `Calendar` and `Internal` are
/// infrastructure failures that callers may retry.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid service: {0}")]
    InvalidService(String),

    #[error("No operating window configured for day {0}")]
    NoWindowConfigured(i16),

    #[error("More than one active operating window for day {0}")]
    AmbiguousWindow(i16),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Appointment {0} is already cancelled")]
    AlreadyCancelled(Uuid),

    #[error("Appointment {0} has already started")]
    PastAppointment(Uuid),

    #[error("Target time {0} is in the past")]
    PastTarget(chrono::DateTime<chrono::Utc>),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for storage, cache and transport failures, false for business rule rejections
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Cache(_) | AppError::Calendar(_) | AppError::Internal(_)
        )
    }

    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchData),
            AppError::InvalidService(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::InvalidService),
            AppError::NoWindowConfigured(_) => (StatusCode::NOT_FOUND, ErrorCode::NoWindowConfigured),
            AppError::AmbiguousWindow(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::AmbiguousWindow)
            }
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::AlreadyCancelled(_) => (StatusCode::CONFLICT, ErrorCode::AlreadyCancelled),
            AppError::PastAppointment(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::PastAppointment)
            }
            AppError::PastTarget(_) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::PastTarget),
            AppError::InvalidTransition(_) => (StatusCode::CONFLICT, ErrorCode::InvalidTransition),
            AppError::SlotConflict(_) => (StatusCode::CONFLICT, ErrorCode::SlotConflict),
            AppError::Validation(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue)
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Cache(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::CacheFailure),
            AppError::Calendar(_) => (StatusCode::BAD_GATEWAY, ErrorCode::CalendarFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_infrastructure() {
            tracing::error!("Infrastructure error: {:?}", self);
            match code {
                ErrorCode::DbFailure => "Database error".to_string(),
                ErrorCode::CacheFailure => "Cache unavailable".to_string(),
                ErrorCode::CalendarFailure => "Calendar service error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_split() {
        assert!(AppError::Internal("boom".into()).is_infrastructure());
        assert!(AppError::Cache("down".into()).is_infrastructure());
        assert!(!AppError::SlotConflict("taken".into()).is_infrastructure());
        assert!(!AppError::AlreadyCancelled(Uuid::nil()).is_infrastructure());
    }

    #[test]
    fn test_status_mapping() {
        let resp = AppError::Forbidden("not yours".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = AppError::SlotConflict("taken".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::NotFound("appointment".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
