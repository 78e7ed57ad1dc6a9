use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jktdocs_core::UserId;

/// Claims carried by an access token.
///
/// Timestamps are unix seconds, as in any JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject identifier (the user the token was issued to).
    pub sub: UserId,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl JwtClaims {
    pub fn new(sub: UserId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: None,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = Some(issuer.into());
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of decoded claims.
///
/// Signature verification happens in [`crate::verifier`]; this only looks at
/// `iat`/`exp` against the supplied clock reading.
pub fn validate_claims(
    claims: &JwtClaims,
    now: DateTime<Utc>,
    leeway_secs: i64,
) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + leeway_secs < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now - leeway_secs >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims_at(now: DateTime<Utc>, ttl: Duration) -> JwtClaims {
        JwtClaims::new(UserId::new(), now, now + ttl)
    }

    #[test]
    fn fresh_token_is_valid() {
        let now = Utc::now();
        let claims = claims_at(now, Duration::minutes(10));
        assert_eq!(validate_claims(&claims, now, 0), Ok(()));
    }

    #[test]
    fn expiry_instant_itself_is_expired() {
        let now = Utc::now();
        let claims = claims_at(now, Duration::minutes(10));
        let at_exp = now + Duration::minutes(10);
        assert_eq!(
            validate_claims(&claims, at_exp, 0),
            Err(TokenValidationError::Expired)
        );
    }

    #[test]
    fn leeway_tolerates_small_skew() {
        let now = Utc::now();
        let claims = claims_at(now + Duration::seconds(5), Duration::minutes(1));
        assert_eq!(
            validate_claims(&claims, now, 0),
            Err(TokenValidationError::NotYetValid)
        );
        assert_eq!(validate_claims(&claims, now, 10), Ok(()));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let claims = JwtClaims::new(UserId::new(), now, now - Duration::seconds(1));
        assert_eq!(
            validate_claims(&claims, now, 0),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
