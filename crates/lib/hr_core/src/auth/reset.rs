//! OTP password-reset workflow.
//!
//! ```text
//! CREATED --(code matches, unused, now < expires_at)--> CONSUMED
//! CREATED --(mismatch)--> CREATED
//! CREATED --(now >= expires_at)--> EXPIRED
//! CONSUMED --(any confirm)--> rejected
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::AuthConfig;
use super::otp::{self, generate_otp};
use super::{AuthError, messages, password};
use crate::clock::Clock;
use crate::models::auth::{NewOtpRecord, OtpRecord, Principal, PrincipalKind};
use crate::notify::{self, Notifier};
use crate::store::{OtpStore, PrincipalStore, find_by_login};

/// Issues, delivers and redeems password-reset codes.
pub struct OtpResetService {
    principals: Arc<dyn PrincipalStore>,
    otps: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: AuthConfig,
}

impl OtpResetService {
    pub fn new(
        principals: Arc<dyn PrincipalStore>,
        otps: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: AuthConfig,
    ) -> Self {
        Self {
            principals,
            otps,
            notifier,
            clock,
            config,
        }
    }

    /// Create and persist a reset code for the principal named by `login`
    /// (username or email), then deliver it.
    ///
    /// If delivery fails after the record is stored, the error carries the
    /// record so delivery can be retried via [`Self::resend`].
    pub async fn request_reset(
        &self,
        kind: PrincipalKind,
        login: &str,
    ) -> Result<OtpRecord, AuthError> {
        let principal = find_by_login(self.principals.as_ref(), kind, login)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        let now = self.clock.now();
        let record = self
            .otps
            .create(NewOtpRecord {
                principal_id: principal.id,
                kind,
                code: generate_otp(),
                requested_at: now,
                expires_at: now + self.config.otp_ttl,
            })
            .await?;

        info!(
            kind = %kind,
            principal_id = %principal.id,
            record_id = %record.id,
            expires_at = %record.expires_at,
            "password reset requested"
        );

        self.deliver(&principal, &record).await?;
        Ok(record)
    }

    /// Re-deliver a still-live record without generating a new code.
    pub async fn resend(&self, record: &OtpRecord) -> Result<(), AuthError> {
        if !record.is_live(self.clock.now()) {
            return Err(AuthError::InvalidOrExpiredOtp);
        }
        let principal = self
            .principals
            .find_by_id(record.kind, record.principal_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        self.deliver(&principal, record).await
    }

    /// Redeem `code` for the principal, marking the matching record used.
    ///
    /// Wrong, expired and already-used codes all fail with the same
    /// [`AuthError::InvalidOrExpiredOtp`].
    pub async fn confirm_reset(
        &self,
        kind: PrincipalKind,
        principal_id: Uuid,
        code: &str,
    ) -> Result<OtpRecord, AuthError> {
        if !otp::is_well_formed(code) {
            return Err(AuthError::InvalidOrExpiredOtp);
        }

        let now = self.clock.now();
        let records = self.otps.list_unused(kind, principal_id).await?;
        let Some(candidate) =
            otp::select_live(&records, code, now, self.config.otp_match_policy).cloned()
        else {
            debug!(kind = %kind, principal_id = %principal_id, "no live record matched");
            return Err(AuthError::InvalidOrExpiredOtp);
        };

        if !self.otps.mark_consumed(kind, candidate.id).await? {
            debug!(record_id = %candidate.id, "record consumed concurrently");
            return Err(AuthError::InvalidOrExpiredOtp);
        }

        info!(
            kind = %kind,
            principal_id = %principal_id,
            record_id = %candidate.id,
            "reset code consumed"
        );
        Ok(OtpRecord {
            is_used: true,
            ..candidate
        })
    }

    /// Redeem `code` and replace the principal's password.
    ///
    /// The new password is validated and hashed before the code is consumed,
    /// so a rejected password leaves the code usable. If the credential write
    /// fails after consumption, the code is released again.
    pub async fn reset_password(
        &self,
        kind: PrincipalKind,
        login: &str,
        code: &str,
        new_password: &str,
    ) -> Result<Principal, AuthError> {
        password::validate_new_password(new_password, self.config.min_password_length)?;

        let principal = find_by_login(self.principals.as_ref(), kind, login)
            .await?
            .ok_or(AuthError::InvalidOrExpiredOtp)?;

        let new_hash = password::hash_password(new_password)?;
        let record = self.confirm_reset(kind, principal.id, code).await?;
        if let Err(e) = self
            .principals
            .update_password_hash(kind, principal.id, &new_hash)
            .await
        {
            // Hand the code back so the caller can retry with it.
            match self.otps.release(kind, record.id).await {
                Ok(_) => warn!(
                    record_id = %record.id,
                    error = %e,
                    "credential write failed, code released"
                ),
                Err(release_err) => error!(
                    record_id = %record.id,
                    error = %e,
                    release_error = %release_err,
                    "credential write failed and code could not be released"
                ),
            }
            return Err(e);
        }

        info!(kind = %kind, principal_id = %principal.id, "password reset completed");

        let message =
            messages::reset_confirmation(&principal, self.clock.now(), self.config.display_offset);
        if let Err(e) = notify::dispatch(
            self.notifier.as_ref(),
            self.config.notify_timeout,
            &principal.email,
            &message,
        )
        .await
        {
            warn!(principal_id = %principal.id, error = %e, "reset confirmation not delivered");
        }

        Ok(principal)
    }

    async fn deliver(&self, principal: &Principal, record: &OtpRecord) -> Result<(), AuthError> {
        let message = messages::otp_message(
            principal,
            &record.code,
            record.expires_at,
            self.config.display_offset,
        );
        notify::dispatch(
            self.notifier.as_ref(),
            self.config.notify_timeout,
            &principal.email,
            &message,
        )
        .await
        .map_err(|e| {
            warn!(record_id = %record.id, error = %e, "reset code not delivered");
            AuthError::NotificationDispatch {
                record: Box::new(record.clone()),
                reason: e.to_string(),
            }
        })
    }
}
