//! Authentication request handlers.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use hr_core::models::auth::PrincipalKind;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::models::{
    ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    MeResponse, MessageResponse, ResetPasswordRequest, TokenResponse,
};
use crate::services::{auth, cookies};

/// `POST /auth/{kind}/login` — authenticate with username + password.
///
/// The token is returned in the body and also set as the session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    Path(kind): Path<PrincipalKind>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let resp = auth::login(&state, kind, &body.username, &body.password).await?;
    let cookie = cookies::session_cookie(
        &resp.access_token,
        resp.expires_in,
        state.config.secure_cookies,
    );
    Ok((jar.add(cookie), Json(resp)))
}

/// `POST /auth/{kind}/forgot-password` — email a reset code.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Path(kind): Path<PrincipalKind>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ForgotPasswordResponse>> {
    let resp = auth::forgot_password(&state, kind, &body.username).await?;
    Ok(Json(resp))
}

/// `POST /auth/{kind}/reset-password` — redeem a reset code.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(kind): Path<PrincipalKind>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::reset_password(
        &state,
        kind,
        &body.username,
        &body.otp,
        &body.new_password,
    )
    .await?;
    Ok(Json(resp))
}

/// `POST /auth/{kind}/change-password` — requires authentication.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Path(kind): Path<PrincipalKind>,
    Extension(AuthenticatedPrincipal(claims)): Extension<AuthenticatedPrincipal>,
    Json(body): Json<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = auth::change_password(
        &state,
        kind,
        claims.kind,
        &claims.sub,
        &body.current_password,
        &body.new_password,
    )
    .await?;
    Ok(Json(resp))
}

/// `GET /auth/me` — claims of the current session.
pub async fn me_handler(
    Extension(AuthenticatedPrincipal(claims)): Extension<AuthenticatedPrincipal>,
) -> Json<MeResponse> {
    Json(MeResponse::from(claims))
}

/// `POST /auth/logout` — clear the session cookie.
///
/// Tokens are stateless; a Bearer token stays valid until it expires.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(cookies::clear_session_cookie(state.config.secure_cookies));
    (jar, Json(MessageResponse::new("Signed out")))
}
