//! Session token issuance and verification (HS256).

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use super::AuthError;
use super::config::AuthConfig;
use crate::clock::Clock;
use crate::models::auth::{PrincipalKind, TokenClaims};

/// Sign a session token for `subject`, valid from `issued_at` for `lifetime`.
pub fn issue_token(
    subject: &str,
    kind: PrincipalKind,
    secret: &[u8],
    issued_at: DateTime<Utc>,
    lifetime: Duration,
) -> Result<String, AuthError> {
    let claims = TokenClaims {
        sub: subject.to_string(),
        kind,
        iat: issued_at.timestamp(),
        exp: (issued_at + lifetime).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::SigningFailure(format!("jwt encode: {e}")))
}

/// Verify signature and expiry, returning the claims.
///
/// Expiry is checked against `now` rather than the library's own clock so
/// that issuance and verification share a single time source. Any failure
/// collapses to [`AuthError::InvalidToken`].
pub fn verify_token(
    token: &str,
    secret: &[u8],
    now: DateTime<Utc>,
) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "iat", "exp"]);

    let claims = decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "token rejected");
            AuthError::InvalidToken
        })?;

    if claims.exp <= now.timestamp() {
        debug!(sub = %claims.sub, exp = claims.exp, "token expired");
        return Err(AuthError::InvalidToken);
    }

    Ok(claims)
}

/// Token issuer/verifier bound to one secret and one clock.
#[derive(Clone)]
pub struct TokenService {
    secret: Arc<[u8]>,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            secret: Arc::from(config.jwt_secret.as_slice()),
            lifetime: config.token_lifetime,
            clock,
        }
    }

    pub fn issue(&self, subject: &str, kind: PrincipalKind) -> Result<String, AuthError> {
        issue_token(subject, kind, &self.secret, self.clock.now(), self.lifetime)
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        verify_token(token, &self.secret, self.clock.now())
    }

    /// Token lifetime in whole seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

/// Unsigned token builders for test suites. Never compiled into release
/// builds unless the `test-fixtures` feature is enabled explicitly.
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{DateTime, Duration, Utc};

    use crate::auth::AuthError;
    use crate::models::auth::{PrincipalKind, TokenClaims};

    /// Build an `alg: none` token that expired at `expired_at`.
    ///
    /// [`super::verify_token`] rejects these regardless of the expiry.
    pub fn issue_expired_token(
        subject: &str,
        kind: PrincipalKind,
        expired_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let header = serde_json::json!({ "alg": "none", "typ": "JWT" });
        let claims = TokenClaims {
            sub: subject.to_string(),
            kind,
            iat: (expired_at - Duration::hours(24)).timestamp(),
            exp: expired_at.timestamp(),
        };

        let header = serde_json::to_vec(&header)
            .map_err(|e| AuthError::SigningFailure(format!("fixture header: {e}")))?;
        let claims = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::SigningFailure(format!("fixture claims: {e}")))?;

        Ok(format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const SECRET: &[u8] = b"test-secret";

    fn now() -> DateTime<Utc> {
        ManualClock::starting_now().now()
    }

    #[test]
    fn verify_returns_subject_after_issue() {
        let t = now();
        for subject in ["alice", "emp-0042", "ünïcödé"] {
            let token =
                issue_token(subject, PrincipalKind::Employee, SECRET, t, Duration::hours(24))
                    .unwrap();
            let claims = verify_token(&token, SECRET, t).unwrap();
            assert_eq!(claims.sub, subject);
            assert_eq!(claims.kind, PrincipalKind::Employee);
            assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        }
    }

    #[test]
    fn token_expires_after_lifetime() {
        let t = now();
        let token = issue_token("alice", PrincipalKind::Admin, SECRET, t, Duration::hours(24))
            .unwrap();

        assert!(verify_token(&token, SECRET, t + Duration::hours(24) - Duration::seconds(1)).is_ok());
        assert!(matches!(
            verify_token(&token, SECRET, t + Duration::hours(24)),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            verify_token(&token, SECRET, t + Duration::hours(24) + Duration::seconds(1)),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn different_key_fails() {
        let t = now();
        let token = issue_token("alice", PrincipalKind::Admin, SECRET, t, Duration::hours(24))
            .unwrap();
        assert!(matches!(
            verify_token(&token, b"another-secret", t),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_payload_fails() {
        let t = now();
        let token = issue_token("alice", PrincipalKind::Employee, SECRET, t, Duration::hours(24))
            .unwrap();
        let forged = issue_token("mallory", PrincipalKind::Admin, b"x", t, Duration::hours(24))
            .unwrap();

        // Splice the forged payload onto the genuine signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(
            verify_token(&spliced, SECRET, t),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        for junk in ["", "abc", "a.b.c", "...."] {
            assert!(matches!(
                verify_token(junk, SECRET, now()),
                Err(AuthError::InvalidToken)
            ));
        }
    }

    #[test]
    fn unsigned_fixture_is_rejected_even_when_unexpired() {
        let t = now();
        let token =
            fixtures::issue_expired_token("alice", PrincipalKind::Admin, t + Duration::hours(1))
                .unwrap();
        assert!(token.ends_with('.'));
        assert!(matches!(
            verify_token(&token, SECRET, t),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_fixture_is_rejected() {
        let t = now();
        let token =
            fixtures::issue_expired_token("alice", PrincipalKind::Employee, t - Duration::hours(1))
                .unwrap();
        assert!(matches!(
            verify_token(&token, SECRET, t),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn service_follows_its_clock() {
        let clock = Arc::new(ManualClock::starting_now());
        let config = AuthConfig::with_secret(SECRET).unwrap();
        let service = TokenService::new(&config, clock.clone());

        let token = service.issue("bob", PrincipalKind::Employee).unwrap();
        assert_eq!(service.verify(&token).unwrap().sub, "bob");
        assert_eq!(service.lifetime_secs(), 86_400);

        clock.advance(Duration::hours(24) + Duration::seconds(1));
        assert!(matches!(service.verify(&token), Err(AuthError::InvalidToken)));
    }
}
