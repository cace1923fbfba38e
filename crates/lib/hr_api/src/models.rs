//! HTTP request and response bodies.

use chrono::{DateTime, Utc};
use hr_core::models::auth::{Principal, PrincipalKind, TokenClaims};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: PrincipalSummary,
}

/// Public profile of a signed-in principal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalSummary {
    pub id: String,
    pub kind: PrincipalKind,
    pub username: String,
    pub email: String,
}

impl From<&Principal> for PrincipalSummary {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.to_string(),
            kind: p.kind,
            username: p.username.clone(),
            email: p.email.clone(),
        }
    }
}

/// `username` may also be the account email.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub username: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub username: String,
    pub kind: PrincipalKind,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<TokenClaims> for MeResponse {
    fn from(c: TokenClaims) -> Self {
        Self {
            username: c.sub,
            kind: c.kind,
            issued_at: c.iat,
            expires_at: c.exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// `None` when the server runs without a database.
    pub db_connected: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
