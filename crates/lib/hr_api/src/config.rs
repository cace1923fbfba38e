//! API server configuration.

use chrono::Duration;
use hr_core::auth::config::{AuthConfig, ConfigError, load_jwt_secret, parse_utc_offset};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Token and reset settings handed to the core services.
    pub auth: AuthConfig,
    /// Mail relay endpoint; `None` logs notifications instead of sending.
    pub mail_relay_url: Option<String>,
    /// `From` address used by the mail relay.
    pub mail_sender: String,
    /// Set the `Secure` flag on session cookies.
    pub secure_cookies: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                                |
    /// |------------------------|----------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3100`                       |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/hr`         |
    /// | `JWT_SECRET` / `AUTH_SECRET` | required                         |
    /// | `TOKEN_LIFETIME_SECS`  | `86400`                                |
    /// | `OTP_TTL_SECS`         | `900`                                  |
    /// | `OTP_MATCH_POLICY`     | `any-unused`                           |
    /// | `NOTIFY_TIMEOUT_SECS`  | `10`                                   |
    /// | `DISPLAY_UTC_OFFSET`   | `+00:00`                               |
    /// | `MIN_PASSWORD_LENGTH`  | `8`                                    |
    /// | `MAIL_RELAY_URL`       | unset (log only)                       |
    /// | `MAIL_SENDER`          | `no-reply@localhost`                   |
    /// | `SECURE_COOKIES`       | `false`                                |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut auth = AuthConfig::with_secret(load_jwt_secret()?)?;
        apply_auth_overrides(&mut auth, |key| std::env::var(key).ok())?;

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/hr".into()),
            auth,
            mail_relay_url: std::env::var("MAIL_RELAY_URL").ok().filter(|u| !u.is_empty()),
            mail_sender: std::env::var("MAIL_SENDER")
                .unwrap_or_else(|_| "no-reply@localhost".into()),
            secure_cookies: parse_var("SECURE_COOKIES", std::env::var("SECURE_COOKIES").ok())?
                .unwrap_or(false),
        })
    }
}

/// Apply the auth-related variables returned by `lookup` on top of `auth`.
///
/// Durations and the minimum password length must be positive.
fn apply_auth_overrides(
    auth: &mut AuthConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let var = |key: &'static str| (key, lookup(key));

    let (key, raw) = var("TOKEN_LIFETIME_SECS");
    if let Some(secs) = parse_var::<i64>(key, raw)? {
        auth.token_lifetime = Duration::seconds(positive(key, secs)?);
    }
    let (key, raw) = var("OTP_TTL_SECS");
    if let Some(secs) = parse_var::<i64>(key, raw)? {
        auth.otp_ttl = Duration::seconds(positive(key, secs)?);
    }
    let (key, raw) = var("OTP_MATCH_POLICY");
    if let Some(policy) = parse_var(key, raw)? {
        auth.otp_match_policy = policy;
    }
    let (key, raw) = var("NOTIFY_TIMEOUT_SECS");
    if let Some(secs) = parse_var::<u64>(key, raw)? {
        auth.notify_timeout = std::time::Duration::from_secs(positive(key, secs)?);
    }
    if let Some(raw) = lookup("DISPLAY_UTC_OFFSET") {
        auth.display_offset = parse_utc_offset(&raw)?;
    }
    let (key, raw) = var("MIN_PASSWORD_LENGTH");
    if let Some(len) = parse_var::<usize>(key, raw)? {
        auth.min_password_length = positive(key, len)?;
    }
    Ok(())
}

/// Parse an optional raw value, rejecting malformed input.
fn parse_var<T>(key: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn positive<T>(key: &'static str, value: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use hr_core::auth::otp::OtpMatchPolicy;

    use super::*;

    fn apply(vars: &[(&str, &str)]) -> Result<AuthConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut auth = AuthConfig::with_secret("s3cret")?;
        apply_auth_overrides(&mut auth, |key| vars.get(key).cloned())?;
        Ok(auth)
    }

    #[test]
    fn overrides_are_applied() {
        let auth = apply(&[
            ("OTP_TTL_SECS", "900"),
            ("TOKEN_LIFETIME_SECS", "3600"),
            ("OTP_MATCH_POLICY", "most-recent"),
            ("NOTIFY_TIMEOUT_SECS", "3"),
            ("MIN_PASSWORD_LENGTH", "12"),
        ])
        .unwrap();
        assert_eq!(auth.otp_ttl, Duration::minutes(15));
        assert_eq!(auth.token_lifetime, Duration::hours(1));
        assert_eq!(auth.otp_match_policy, OtpMatchPolicy::MostRecent);
        assert_eq!(auth.notify_timeout, std::time::Duration::from_secs(3));
        assert_eq!(auth.min_password_length, 12);
    }

    #[test]
    fn unset_and_blank_values_keep_defaults() {
        let auth = apply(&[("OTP_TTL_SECS", "  ")]).unwrap();
        assert_eq!(auth.otp_ttl, AuthConfig::default().otp_ttl);
    }

    #[test]
    fn non_positive_values_are_rejected() {
        for (key, value) in [
            ("OTP_TTL_SECS", "0"),
            ("TOKEN_LIFETIME_SECS", "-5"),
            ("NOTIFY_TIMEOUT_SECS", "0"),
            ("MIN_PASSWORD_LENGTH", "0"),
        ] {
            let err = apply(&[(key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{key}={value} gave {err:?}"
            );
        }
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(apply(&[("NOTIFY_TIMEOUT_SECS", "soon")]).is_err());
        assert!(apply(&[("OTP_MATCH_POLICY", "latest")]).is_err());
    }
}
