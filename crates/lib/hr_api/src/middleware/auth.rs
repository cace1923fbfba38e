//! Authentication middleware — session token extraction and verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use hr_core::models::auth::TokenClaims;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::SESSION_COOKIE;

/// Verified claims, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub TokenClaims);

/// Axum middleware: takes the token from `Authorization: Bearer <token>`
/// or the session cookie, verifies it, and injects
/// [`AuthenticatedPrincipal`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match request.headers().get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::to_owned)
            .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?,
        None => jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?,
    };

    let claims = state.auth.verify(&token)?;
    request
        .extensions_mut()
        .insert(AuthenticatedPrincipal(claims));

    Ok(next.run(request).await)
}
