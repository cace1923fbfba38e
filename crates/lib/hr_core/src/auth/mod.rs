//! Authentication and credential recovery.
//!
//! Provides session-token issuance/verification, password hashing, and the
//! OTP password-reset workflow, shared by `hr_api` and `hr_cli`.

pub mod config;
pub mod jwt;
pub mod messages;
pub mod otp;
pub mod password;
pub mod queries;
pub mod reset;
pub mod service;

use thiserror::Error;

use crate::models::auth::OtpRecord;

/// Authentication errors.
///
/// Verification failures carry no detail: the caller cannot
/// tell an expired token from a tampered one, or a wrong code from a used one.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Principal not found")]
    PrincipalNotFound,

    #[error("Notification dispatch failed: {reason}")]
    NotificationDispatch {
        /// The record was persisted before dispatch failed.
        record: Box<OtpRecord>,
        reason: String,
    },

    #[error("Token signing failed: {0}")]
    SigningFailure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
