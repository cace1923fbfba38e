//! Authentication configuration.

use std::fmt;
use std::time::Duration as StdDuration;

use chrono::{Duration, FixedOffset, Offset, Utc};
use thiserror::Error;

use super::otp::OtpMatchPolicy;

/// Default session token lifetime: 24 hours.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Default OTP validity window: 15 minutes.
pub const DEFAULT_OTP_TTL_SECS: i64 = 15 * 60;

/// Default upper bound on a single notification dispatch.
pub const DEFAULT_NOTIFY_TIMEOUT_SECS: u64 = 10;

/// Default minimum length accepted for a new password.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Errors raised while assembling configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT secret is not set (expected JWT_SECRET or AUTH_SECRET)")]
    MissingSecret,

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Configuration shared by the token and reset services.
///
/// Built once at startup and handed to each service; nothing in the
/// services reads the environment.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing key.
    pub jwt_secret: Vec<u8>,
    /// Session token lifetime.
    pub token_lifetime: Duration,
    /// How long a reset code stays valid after it is requested.
    pub otp_ttl: Duration,
    /// Which unused records a supplied code is matched against.
    pub otp_match_policy: OtpMatchPolicy,
    /// Upper bound on one notification dispatch.
    pub notify_timeout: StdDuration,
    /// Offset used when rendering instants in notification bodies.
    pub display_offset: FixedOffset,
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Defaults with the given signing secret. An empty secret is rejected.
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let jwt_secret = secret.into();
        if jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self {
            jwt_secret,
            ..Self::default()
        })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Vec::new(),
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            otp_ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
            otp_match_policy: OtpMatchPolicy::default(),
            notify_timeout: StdDuration::from_secs(DEFAULT_NOTIFY_TIMEOUT_SECS),
            display_offset: Utc.fix(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("otp_ttl", &self.otp_ttl)
            .field("otp_match_policy", &self.otp_match_policy)
            .field("notify_timeout", &self.notify_timeout)
            .field("display_offset", &self.display_offset)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET`.
///
/// Absence is a fatal startup error.
pub fn load_jwt_secret() -> Result<Vec<u8>, ConfigError> {
    for var in ["JWT_SECRET", "AUTH_SECRET"] {
        if let Ok(secret) = std::env::var(var)
            && !secret.is_empty()
        {
            return Ok(secret.into_bytes());
        }
    }
    Err(ConfigError::MissingSecret)
}

/// Parse a UTC offset such as `+05:30`, `-0800` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "DISPLAY_UTC_OFFSET",
        reason: format!("{reason}: '{raw}'"),
    };

    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match trimmed.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(invalid("expected leading '+' or '-'")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected HH:MM"));
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid("bad hours"))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid("bad minutes"))?;
    if minutes >= 60 {
        return Err(invalid("minutes must be below 60"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| invalid("out of range"))
}
