//! Authentication service — request flows delegating to `hr_core::auth`.

use hr_core::auth::AuthError;
use hr_core::models::auth::PrincipalKind;
use tracing::info;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{ForgotPasswordResponse, MessageResponse, PrincipalSummary, TokenResponse};

/// Shown for every forgot-password request, known account or not.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If the account exists, a reset code has been sent to its email address";

/// Authenticate and build the token response.
pub async fn login(
    state: &AppState,
    kind: PrincipalKind,
    username: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let out = state.auth.login(kind, username, password).await?;
    Ok(TokenResponse {
        access_token: out.token,
        token_type: out.token_type.to_string(),
        expires_in: out.expires_in,
        user: PrincipalSummary::from(&out.principal),
    })
}

/// Start a password reset.
///
/// Unknown accounts get the same body as known ones, with an expiry computed
/// the same way, so the endpoint cannot be used to enumerate users.
pub async fn forgot_password(
    state: &AppState,
    kind: PrincipalKind,
    login: &str,
) -> AppResult<ForgotPasswordResponse> {
    let expires_at = match state.reset.request_reset(kind, login).await {
        Ok(record) => record.expires_at,
        Err(AuthError::PrincipalNotFound) => {
            info!(kind = %kind, "reset requested for unknown account");
            state.clock.now() + state.config.auth.otp_ttl
        }
        Err(e) => return Err(AppError::from(e)),
    };
    Ok(ForgotPasswordResponse {
        message: RESET_REQUESTED_MESSAGE.to_string(),
        expires_at,
    })
}

/// Redeem a reset code and set the new password.
pub async fn reset_password(
    state: &AppState,
    kind: PrincipalKind,
    login: &str,
    otp: &str,
    new_password: &str,
) -> AppResult<MessageResponse> {
    state
        .reset
        .reset_password(kind, login, otp, new_password)
        .await?;
    Ok(MessageResponse::new("Password has been reset"))
}

/// Change the password of the signed-in principal.
///
/// The token's kind must match the route's kind.
pub async fn change_password(
    state: &AppState,
    kind: PrincipalKind,
    token_kind: PrincipalKind,
    username: &str,
    current_password: &str,
    new_password: &str,
) -> AppResult<MessageResponse> {
    if kind != token_kind {
        return Err(AppError::Unauthorized("Invalid or expired token".into()));
    }
    state
        .auth
        .change_password(kind, username, current_password, new_password)
        .await?;
    Ok(MessageResponse::new("Password has been changed"))
}
