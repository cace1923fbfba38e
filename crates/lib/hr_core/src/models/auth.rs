//! Authentication domain models.
//!
//! These are internal domain models, distinct from the HTTP request/response
//! shapes in `hr_api` (which use `#[serde(rename_all = "camelCase")]`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two kinds of principal that can authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    Employee,
}

impl PrincipalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin",
            PrincipalKind::Employee => "employee",
        }
    }

    /// Human-readable label used in notification bodies.
    pub fn label(self) -> &'static str {
        match self {
            PrincipalKind::Admin => "Administrator",
            PrincipalKind::Employee => "Employee",
        }
    }

    /// Table holding principals of this kind.
    pub(crate) fn principal_table(self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admins",
            PrincipalKind::Employee => "employees",
        }
    }

    /// Table holding OTP records for this kind.
    pub(crate) fn otp_table(self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin_otps",
            PrincipalKind::Employee => "employee_otps",
        }
    }

    /// Foreign-key column in the OTP table.
    pub(crate) fn owner_column(self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin_id",
            PrincipalKind::Employee => "employee_id",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(PrincipalKind::Admin),
            "employee" => Ok(PrincipalKind::Employee),
            other => Err(format!("unknown principal kind '{other}'")),
        }
    }
}

/// An administrator or employee able to authenticate.
///
/// Only the credential field is ever written by the auth core; the rest of
/// the profile belongs to the HR record layer.
#[derive(Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub kind: PrincipalKind,
    pub username: String,
    pub email: String,
    /// bcrypt hash of the current password.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// JWT claims embedded in session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — principal username (standard JWT `sub` claim).
    pub sub: String,
    /// Which principal table the subject lives in.
    pub kind: PrincipalKind,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// A persisted password-reset code. Never deleted; `is_used` flips once.
#[derive(Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub kind: PrincipalKind,
    #[serde(skip_serializing)]
    pub code: String,
    pub is_used: bool,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Unused and not yet expired at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now < self.expires_at
    }
}

impl fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpRecord")
            .field("id", &self.id)
            .field("principal_id", &self.principal_id)
            .field("kind", &self.kind)
            .field("is_used", &self.is_used)
            .field("requested_at", &self.requested_at)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Input for persisting a fresh OTP record.
#[derive(Debug, Clone)]
pub struct NewOtpRecord {
    pub principal_id: Uuid,
    pub kind: PrincipalKind,
    pub code: String,
    pub requested_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
