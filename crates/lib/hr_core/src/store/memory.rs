//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{OtpStore, PrincipalStore};
use crate::auth::AuthError;
use crate::models::auth::{NewOtpRecord, OtpRecord, Principal, PrincipalKind};
use crate::uuid::uuidv7;

/// Principals and OTP records held behind mutexes.
///
/// `mark_consumed` is a compare-and-set under the OTP lock, mirroring the
/// conditional `UPDATE` used by the PostgreSQL store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    principals: Mutex<HashMap<(PrincipalKind, Uuid), Principal>>,
    otps: Mutex<HashMap<(PrincipalKind, Uuid), OtpRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AuthError> {
    mutex
        .lock()
        .map_err(|_| AuthError::Store("memory store lock poisoned".into()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a principal with an already-hashed password.
    pub fn insert_principal(
        &self,
        kind: PrincipalKind,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Principal, AuthError> {
        let principal = Principal {
            id: Uuid::new_v4(),
            kind,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        lock(&self.principals)?.insert((kind, principal.id), principal.clone());
        Ok(principal)
    }

    /// Every record for the principal, used or not, oldest first.
    pub fn otp_history(
        &self,
        kind: PrincipalKind,
        principal_id: Uuid,
    ) -> Result<Vec<OtpRecord>, AuthError> {
        let mut records: Vec<OtpRecord> = lock(&self.otps)?
            .values()
            .filter(|r| r.kind == kind && r.principal_id == principal_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.requested_at, r.id));
        Ok(records)
    }

    fn find_principal(
        &self,
        kind: PrincipalKind,
        pred: impl Fn(&Principal) -> bool,
    ) -> Result<Option<Principal>, AuthError> {
        Ok(lock(&self.principals)?
            .values()
            .find(|p| p.kind == kind && pred(p))
            .cloned())
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_by_username(
        &self,
        kind: PrincipalKind,
        username: &str,
    ) -> Result<Option<Principal>, AuthError> {
        self.find_principal(kind, |p| p.username == username)
    }

    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, AuthError> {
        self.find_principal(kind, |p| p.email.eq_ignore_ascii_case(email))
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: Uuid,
    ) -> Result<Option<Principal>, AuthError> {
        Ok(lock(&self.principals)?.get(&(kind, id)).cloned())
    }

    async fn update_password_hash(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut principals = lock(&self.principals)?;
        let principal = principals
            .get_mut(&(kind, id))
            .ok_or(AuthError::PrincipalNotFound)?;
        principal.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn create(&self, record: NewOtpRecord) -> Result<OtpRecord, AuthError> {
        let record = OtpRecord {
            id: uuidv7(),
            principal_id: record.principal_id,
            kind: record.kind,
            code: record.code,
            is_used: false,
            requested_at: record.requested_at,
            expires_at: record.expires_at,
            created_at: record.requested_at,
        };
        lock(&self.otps)?.insert((record.kind, record.id), record.clone());
        Ok(record)
    }

    async fn list_unused(
        &self,
        kind: PrincipalKind,
        principal_id: Uuid,
    ) -> Result<Vec<OtpRecord>, AuthError> {
        let mut records: Vec<OtpRecord> = lock(&self.otps)?
            .values()
            .filter(|r| r.kind == kind && r.principal_id == principal_id && !r.is_used)
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse((r.requested_at, r.id)));
        Ok(records)
    }

    async fn mark_consumed(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError> {
        let mut otps = lock(&self.otps)?;
        match otps.get_mut(&(kind, id)) {
            Some(record) if !record.is_used => {
                record.is_used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError> {
        let mut otps = lock(&self.otps)?;
        match otps.get_mut(&(kind, id)) {
            Some(record) if record.is_used => {
                record.is_used = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
