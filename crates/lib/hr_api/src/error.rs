//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hr_core::auth::AuthError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Notification delivery failed")]
    DeliveryFailed,

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::InvalidOtp => (
                StatusCode::BAD_REQUEST,
                "invalid_otp",
                "Invalid or expired OTP",
            ),
            AppError::DeliveryFailed => (
                StatusCode::BAD_GATEWAY,
                "delivery_failed",
                "The code was created but could not be delivered; try again shortly",
            ),
            AppError::Internal(detail) => {
                error!(%detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken => AppError::Unauthorized("Invalid or expired token".into()),
            AuthError::InvalidOrExpiredOtp => AppError::InvalidOtp,
            AuthError::PrincipalNotFound => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::NotificationDispatch { .. } => AppError::DeliveryFailed,
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::SigningFailure(msg)
            | AuthError::Store(msg)
            | AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failures_map_to_client_errors() {
        let status = |e: AuthError| AppError::from(e).into_response().status();
        assert_eq!(status(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::InvalidOrExpiredOtp), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(AuthError::SigningFailure("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
