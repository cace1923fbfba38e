//! Persistence seams for the auth core.
//!
//! [`PgAuthStore`](crate::auth::queries::PgAuthStore) implements both traits
//! over PostgreSQL; [`MemoryStore`] backs tests and local runs.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::models::auth::{NewOtpRecord, OtpRecord, Principal, PrincipalKind};

pub use memory::MemoryStore;

/// Read access to principals plus writes to the credential field only.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_username(
        &self,
        kind: PrincipalKind,
        username: &str,
    ) -> Result<Option<Principal>, AuthError>;

    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, AuthError>;

    async fn find_by_id(&self, kind: PrincipalKind, id: Uuid)
    -> Result<Option<Principal>, AuthError>;

    /// Replace the stored bcrypt hash. Fails with
    /// [`AuthError::PrincipalNotFound`] when `id` does not exist.
    async fn update_password_hash(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthError>;
}

/// OTP record persistence. Records are never deleted.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn create(&self, record: NewOtpRecord) -> Result<OtpRecord, AuthError>;

    /// Unused records for the principal, newest request first. Expired
    /// records are included; the caller decides liveness.
    async fn list_unused(
        &self,
        kind: PrincipalKind,
        principal_id: Uuid,
    ) -> Result<Vec<OtpRecord>, AuthError>;

    /// Flip `is_used` to true only if it is still false.
    ///
    /// Returns `true` for the single caller that performed the flip.
    async fn mark_consumed(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError>;

    /// Flip `is_used` back to false only if it is currently true.
    ///
    /// Undoes a [`Self::mark_consumed`] whose follow-up credential write
    /// failed. Returns `true` if the record was released.
    async fn release(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError>;
}

/// Look a principal up by username, falling back to email.
pub async fn find_by_login(
    store: &dyn PrincipalStore,
    kind: PrincipalKind,
    login: &str,
) -> Result<Option<Principal>, AuthError> {
    if let Some(principal) = store.find_by_username(kind, login).await? {
        return Ok(Some(principal));
    }
    store.find_by_email(kind, login).await
}
