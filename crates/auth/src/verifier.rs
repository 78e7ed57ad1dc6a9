//! Bearer-token verification and issuance.
//!
//! Verification is stateless; the only side effect is the clock reading the
//! caller passes in. Every failure is reported as [`AuthError::Unauthorized`]
//! so callers cannot tell a bad signature from an expired token. The precise
//! cause is logged at `debug` for operators.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use jktdocs_core::UserId;

use crate::claims::{JwtClaims, validate_claims};
use crate::error::AuthError;

/// Signature scheme used for access tokens.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenAlgorithm {
    /// Shared secret.
    Hs256,
    /// RSA key pair (PEM).
    Rs256,
}

impl TokenAlgorithm {
    fn jwt(self) -> Algorithm {
        match self {
            TokenAlgorithm::Hs256 => Algorithm::HS256,
            TokenAlgorithm::Rs256 => Algorithm::RS256,
        }
    }
}

impl core::str::FromStr for TokenAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(TokenAlgorithm::Hs256),
            "RS256" => Ok(TokenAlgorithm::Rs256),
            other => Err(format!("unsupported token algorithm '{other}'")),
        }
    }
}

/// Validates a raw bearer token and returns its claims.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError>;
}

/// JWT verifier backed by `jsonwebtoken`.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    algorithm: TokenAlgorithm,
    issuer: Option<String>,
    leeway_secs: i64,
}

impl JwtVerifier {
    pub fn hs256(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            algorithm: TokenAlgorithm::Hs256,
            issuer: None,
            leeway_secs: 0,
        }
    }

    pub fn rs256_pem(public_key_pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            key: DecodingKey::from_rsa_pem(public_key_pem)?,
            algorithm: TokenAlgorithm::Rs256,
            issuer: None,
            leeway_secs: 0,
        })
    }

    /// Require tokens to carry this `iss`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_leeway(mut self, leeway_secs: i64) -> Self {
        self.leeway_secs = leeway_secs.max(0);
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm.jwt());
        // Time checks run in `validate_claims` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        validation
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, AuthError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AuthError::Unauthorized
            })?;

        validate_claims(&data.claims, now, self.leeway_secs).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AuthError::Unauthorized
        })?;

        Ok(data.claims)
    }
}

/// Mints access tokens for authenticated users.
#[derive(Clone)]
pub struct JwtIssuer {
    key: EncodingKey,
    algorithm: TokenAlgorithm,
    issuer: Option<String>,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn hs256(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_ref()),
            algorithm: TokenAlgorithm::Hs256,
            issuer: None,
            ttl,
        }
    }

    pub fn rs256_pem(private_key_pem: &[u8], ttl: Duration) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self {
            key: EncodingKey::from_rsa_pem(private_key_pem)?,
            algorithm: TokenAlgorithm::Rs256,
            issuer: None,
            ttl,
        })
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::internal("token expiry out of range"))?;
        let mut claims = JwtClaims::new(subject, now, expires_at);
        claims.iss = self.issuer.clone();

        jsonwebtoken::encode(&Header::new(self.algorithm.jwt()), &claims, &self.key)
            .map_err(|e| AuthError::internal(format!("failed to sign token: {e}")))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Unauthorized)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::Unauthorized)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Unauthorized);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Unauthorized);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn issuer() -> JwtIssuer {
        JwtIssuer::hs256(SECRET, Duration::minutes(10))
    }

    #[test]
    fn issued_token_round_trips_subject() {
        let now = Utc::now();
        let subject = UserId::new();
        let token = issuer().issue(subject, now).unwrap();

        let claims = JwtVerifier::hs256(SECRET).verify(&token, now).unwrap();
        assert_eq!(claims.sub, subject);
    }

    #[test]
    fn expiry_past_the_calendar_is_internal() {
        let issuer = JwtIssuer::hs256(SECRET, Duration::days(100_000_000));
        assert!(matches!(issuer.issue(UserId::new(), Utc::now()), Err(AuthError::Internal(_))));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let issued = Utc::now() - Duration::hours(1);
        let token = issuer().issue(UserId::new(), issued).unwrap();

        let err = JwtVerifier::hs256(SECRET).verify(&token, Utc::now()).unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let now = Utc::now();
        let token = issuer().issue(UserId::new(), now).unwrap();

        let err = JwtVerifier::hs256("other-secret").verify(&token, now).unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[test]
    fn garbage_token_is_unauthorized() {
        let err = JwtVerifier::hs256(SECRET)
            .verify("definitely.not.ajwt", Utc::now())
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let now = Utc::now();
        let token = issuer().with_issuer("someone-else").issue(UserId::new(), now).unwrap();

        let verifier = JwtVerifier::hs256(SECRET).with_issuer("jkt-docs");
        assert_eq!(verifier.verify(&token, now).unwrap_err(), AuthError::Unauthorized);

        let token = issuer().with_issuer("jkt-docs").issue(UserId::new(), now).unwrap();
        assert!(verifier.verify(&token, now).is_ok());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(Some("Bearer abc")), Ok("abc"));
        assert_eq!(extract_bearer(Some("bearer  abc ")), Ok("abc"));
        assert_eq!(extract_bearer(None), Err(AuthError::Unauthorized));
        assert_eq!(extract_bearer(Some("Basic abc")), Err(AuthError::Unauthorized));
        assert_eq!(extract_bearer(Some("Bearer ")), Err(AuthError::Unauthorized));
        assert_eq!(extract_bearer(Some("Bearer")), Err(AuthError::Unauthorized));
    }
}
