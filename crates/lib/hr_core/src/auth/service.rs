//! Authentication service — login, token verification and password change.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::AuthConfig;
use super::jwt::TokenService;
use super::{AuthError, messages, password};
use crate::clock::Clock;
use crate::models::auth::{Principal, PrincipalKind, TokenClaims};
use crate::notify::{self, Notifier};
use crate::store::PrincipalStore;

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token.
    pub token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub principal: Principal,
}

/// Credential checks on top of a [`PrincipalStore`] and [`TokenService`].
pub struct AuthService {
    principals: Arc<dyn PrincipalStore>,
    notifier: Arc<dyn Notifier>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        Self {
            principals,
            notifier,
            tokens: TokenService::new(&config, clock.clone()),
            clock,
            config,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authenticate with username + password and issue a session token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(
        &self,
        kind: PrincipalKind,
        username: &str,
        password: &str,
    ) -> Result<LoginOutput, AuthError> {
        let principal = self
            .principals
            .find_by_username(kind, username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &principal.password_hash)? {
            info!(kind = %kind, principal_id = %principal.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&principal.username, kind)?;
        info!(kind = %kind, principal_id = %principal.id, "login succeeded");

        Ok(LoginOutput {
            token,
            token_type: "Bearer",
            expires_in: self.tokens.lifetime_secs(),
            principal,
        })
    }

    /// Verify a session token; see [`TokenService::verify`].
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        self.tokens.verify(token)
    }

    /// Replace the password of a signed-in principal after re-checking the
    /// current one, then send a best-effort confirmation.
    pub async fn change_password(
        &self,
        kind: PrincipalKind,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        password::validate_new_password(new_password, self.config.min_password_length)?;

        let principal = self
            .principals
            .find_by_username(kind, username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(current_password, &principal.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = password::hash_password(new_password)?;
        self.principals
            .update_password_hash(kind, principal.id, &new_hash)
            .await?;
        info!(kind = %kind, principal_id = %principal.id, "password changed");

        let message =
            messages::change_confirmation(&principal, self.clock.now(), self.config.display_offset);
        if let Err(e) = notify::dispatch(
            self.notifier.as_ref(),
            self.config.notify_timeout,
            &principal.email,
            &message,
        )
        .await
        {
            warn!(principal_id = %principal.id, error = %e, "change confirmation not delivered");
        }

        Ok(())
    }
}
