use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use jktdocs_auth::{JwtIssuer, NameCollation};

use super::{ServiceError, verify_blocking};
use crate::store::{UserRecord, UserStore};

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserRecord,
}

/// Password login that mints a bearer token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    issuer: JwtIssuer,
    collation: NameCollation,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, issuer: JwtIssuer, collation: NameCollation) -> Self {
        Self {
            users,
            issuer,
            collation,
        }
    }

    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<LoginOutcome, ServiceError> {
        let rejected = || {
            tracing::debug!("login rejected");
            ServiceError::InvalidCredentials
        };
        let user = self
            .users
            .find_user_by_email(email.trim(), self.collation)
            .await?
            .ok_or_else(rejected)?;
        if !verify_blocking(user.password_hash.clone(), password.to_string()).await? {
            return Err(rejected());
        }

        let token = self.issuer.issue(user.id, now)?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome { token, user })
    }
}
