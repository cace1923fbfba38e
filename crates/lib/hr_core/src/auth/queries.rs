//! Auth-related database queries.
//!
//! Table names come from [`PrincipalKind`] and are static strings, never
//! user input.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{NewOtpRecord, OtpRecord, Principal, PrincipalKind};
use crate::store::{OtpStore, PrincipalStore};
use crate::uuid::uuidv7;

type PrincipalRow = (Uuid, String, String, String);
type OtpRow = (Uuid, Uuid, String, bool, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>);

fn principal_from_row(kind: PrincipalKind, row: PrincipalRow) -> Principal {
    let (id, username, email, password_hash) = row;
    Principal {
        id,
        kind,
        username,
        email,
        password_hash,
    }
}

fn otp_from_row(kind: PrincipalKind, row: OtpRow) -> OtpRecord {
    let (id, principal_id, code, is_used, requested_at, expires_at, created_at) = row;
    OtpRecord {
        id,
        principal_id,
        kind,
        code,
        is_used,
        requested_at,
        expires_at,
        created_at,
    }
}

/// PostgreSQL-backed principal and OTP store.
#[derive(Debug, Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a principal with an already-hashed password, returning it.
    ///
    /// Used by the operator CLI to seed the first administrator.
    pub async fn create_principal(
        &self,
        kind: PrincipalKind,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Principal, AuthError> {
        let sql = format!(
            "INSERT INTO {} (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash",
            kind.principal_table()
        );
        let row = sqlx::query_as::<_, PrincipalRow>(&sql)
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(principal_from_row(kind, row))
    }

    async fn find_principal_by(
        &self,
        kind: PrincipalKind,
        predicate: &str,
        value: &str,
    ) -> Result<Option<Principal>, AuthError> {
        let sql = format!(
            "SELECT id, username, email, password_hash FROM {} WHERE {predicate}",
            kind.principal_table()
        );
        let row = sqlx::query_as::<_, PrincipalRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| principal_from_row(kind, r)))
    }
}

#[async_trait]
impl PrincipalStore for PgAuthStore {
    async fn find_by_username(
        &self,
        kind: PrincipalKind,
        username: &str,
    ) -> Result<Option<Principal>, AuthError> {
        self.find_principal_by(kind, "username = $1", username).await
    }

    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> Result<Option<Principal>, AuthError> {
        self.find_principal_by(kind, "lower(email) = lower($1)", email)
            .await
    }

    async fn find_by_id(
        &self,
        kind: PrincipalKind,
        id: Uuid,
    ) -> Result<Option<Principal>, AuthError> {
        let sql = format!(
            "SELECT id, username, email, password_hash FROM {} WHERE id = $1",
            kind.principal_table()
        );
        let row = sqlx::query_as::<_, PrincipalRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| principal_from_row(kind, r)))
    }

    async fn update_password_hash(
        &self,
        kind: PrincipalKind,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let sql = format!(
            "UPDATE {} SET password_hash = $2, updated_at = now() WHERE id = $1",
            kind.principal_table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AuthError::PrincipalNotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl OtpStore for PgAuthStore {
    async fn create(&self, record: NewOtpRecord) -> Result<OtpRecord, AuthError> {
        let kind = record.kind;
        let sql = format!(
            "INSERT INTO {table} (id, {owner}, code, requested_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, {owner}, code, is_used, requested_at, expires_at, created_at",
            table = kind.otp_table(),
            owner = kind.owner_column(),
        );
        let row = sqlx::query_as::<_, OtpRow>(&sql)
            .bind(uuidv7())
            .bind(record.principal_id)
            .bind(&record.code)
            .bind(record.requested_at)
            .bind(record.expires_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(otp_from_row(kind, row))
    }

    async fn list_unused(
        &self,
        kind: PrincipalKind,
        principal_id: Uuid,
    ) -> Result<Vec<OtpRecord>, AuthError> {
        let sql = format!(
            "SELECT id, {owner}, code, is_used, requested_at, expires_at, created_at \
             FROM {table} \
             WHERE {owner} = $1 AND is_used = FALSE \
             ORDER BY requested_at DESC, id DESC",
            table = kind.otp_table(),
            owner = kind.owner_column(),
        );
        let rows = sqlx::query_as::<_, OtpRow>(&sql)
            .bind(principal_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| otp_from_row(kind, r)).collect())
    }

    async fn mark_consumed(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError> {
        // The `is_used = FALSE` guard makes concurrent confirmations race on
        // the row lock; only one sees a row affected.
        let sql = format!(
            "UPDATE {} SET is_used = TRUE WHERE id = $1 AND is_used = FALSE",
            kind.otp_table()
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, kind: PrincipalKind, id: Uuid) -> Result<bool, AuthError> {
        let sql = format!(
            "UPDATE {} SET is_used = FALSE WHERE id = $1 AND is_used = TRUE",
            kind.otp_table()
        );
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }
}
