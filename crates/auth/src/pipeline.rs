//! The ordered gate in front of every protected operation.
//!
//! `UNVERIFIED → VERIFIED → RESOLVED → DECIDED`: each stage consumes the
//! previous stage's output, so a later stage cannot run on a request that
//! failed an earlier one. Nothing here mutates state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::authorize::{RequiredPermission, authorize};
use crate::claims::JwtClaims;
use crate::error::AuthError;
use crate::permissions::Module;
use crate::resolver::{SubjectResolver, SubjectStore};
use crate::subject::Subject;
use crate::verifier::{CredentialVerifier, extract_bearer};

/// Credential checked; subject not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub claims: JwtClaims,
}

/// Subject loaded with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub subject: Subject,
}

/// Request allowed. Handlers read the acting subject from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub subject: Subject,
    /// What the operation demanded; `None` when it declares no module.
    pub required: Option<RequiredPermission>,
}

#[derive(Clone)]
pub struct AuthorizationPipeline {
    verifier: Arc<dyn CredentialVerifier>,
    resolver: SubjectResolver,
}

impl AuthorizationPipeline {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, store: Arc<dyn SubjectStore>) -> Self {
        Self {
            verifier,
            resolver: SubjectResolver::new(store),
        }
    }

    /// Check the `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Result<Verified, AuthError> {
        let token = extract_bearer(authorization)?;
        let claims = self.verifier.verify(token, now)?;
        Ok(Verified { claims })
    }

    pub async fn resolve(&self, verified: Verified) -> Result<Resolved, AuthError> {
        let subject = self.resolver.resolve(verified.claims.sub).await?;
        Ok(Resolved { subject })
    }

    /// Decide for the module declared by the operation and the attempted method.
    ///
    /// `module == None` means the operation declares nothing and is allowed.
    pub fn decide(resolved: Resolved, module: Option<Module>, method: &str) -> Result<Authorized, AuthError> {
        let required = module
            .map(|m| RequiredPermission::from_method(m, method))
            .transpose()
            .inspect_err(|e| tracing::debug!(subject_id = %resolved.subject.id, method, error = %e, "request denied"))?;

        authorize(&resolved.subject, required.as_ref()).inspect_err(|e| {
            tracing::debug!(subject_id = %resolved.subject.id, method, error = %e, "request denied")
        })?;

        Ok(Authorized {
            subject: resolved.subject,
            required,
        })
    }

    /// All three stages in order.
    pub async fn run(
        &self,
        authorization: Option<&str>,
        module: Option<Module>,
        method: &str,
        now: DateTime<Utc>,
    ) -> Result<Authorized, AuthError> {
        let verified = self.verify(authorization, now)?;
        let resolved = self.resolve(verified).await?;
        Self::decide(resolved, module, method)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use jktdocs_core::{RoleId, UserId};

    use super::*;
    use crate::permissions::{Action, PermissionMap};
    use crate::resolver::test_support::MapSubjectStore;
    use crate::roles::Role;
    use crate::verifier::{JwtIssuer, JwtVerifier};

    const SECRET: &str = "pipeline-secret";

    struct Fixture {
        pipeline: AuthorizationPipeline,
        store: Arc<MapSubjectStore>,
        subject: Subject,
    }

    fn fixture(permissions: PermissionMap) -> Fixture {
        let subject = Subject {
            id: UserId::new(),
            email: "carol@example.com".to_string(),
            name: "Carol".to_string(),
            role: Role::new(RoleId::new(), "Reviewer", permissions),
        };
        let store = Arc::new(MapSubjectStore::with(subject.clone()));
        let pipeline = AuthorizationPipeline::new(Arc::new(JwtVerifier::hs256(SECRET)), store.clone());
        Fixture {
            pipeline,
            store,
            subject,
        }
    }

    fn bearer(subject: UserId, issued: DateTime<Utc>) -> String {
        let token = JwtIssuer::hs256(SECRET, Duration::minutes(10))
            .issue(subject, issued)
            .unwrap();
        format!("Bearer {token}")
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let f = fixture(PermissionMap::full());
        let err = f.pipeline.run(None, Some(Module::User), "GET", Utc::now()).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized_never_forbidden() {
        let f = fixture(PermissionMap::new());
        let header = bearer(f.subject.id, Utc::now() - Duration::hours(2));
        let err = f
            .pipeline
            .run(Some(&header), Some(Module::User), "GET", Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn deleted_subject_is_unauthorized() {
        let f = fixture(PermissionMap::full());
        let now = Utc::now();
        let header = bearer(f.subject.id, now);
        f.store.remove(f.subject.id);

        let err = f.pipeline.run(Some(&header), None, "GET", now).await.unwrap_err();
        assert_eq!(err, AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn denied_bit_is_forbidden() {
        let f = fixture(PermissionMap::new().with(Module::Document, "0100"));
        let now = Utc::now();
        let header = bearer(f.subject.id, now);

        let err = f
            .pipeline
            .run(Some(&header), Some(Module::Document), "DELETE", now)
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Forbidden("Unauthorized document module".to_string()));
    }

    #[tokio::test]
    async fn allowed_request_carries_subject_and_requirement() {
        let permissions = PermissionMap::new().with(Module::Document, "0100");
        let f = fixture(permissions.clone());
        let now = Utc::now();
        let header = bearer(f.subject.id, now);

        let authorized = f
            .pipeline
            .run(Some(&header), Some(Module::Document), "GET", now)
            .await
            .unwrap();
        assert_eq!(authorized.subject, f.subject);
        assert_eq!(authorized.subject.role.permissions, permissions);
        assert_eq!(
            authorized.required,
            Some(RequiredPermission::new(Module::Document, Action::Read))
        );
    }

    #[tokio::test]
    async fn undeclared_module_allows_any_resolved_subject() {
        let f = fixture(PermissionMap::new());
        let now = Utc::now();
        let header = bearer(f.subject.id, now);

        let authorized = f.pipeline.run(Some(&header), None, "DELETE", now).await.unwrap();
        assert_eq!(authorized.required, None);
    }
}
