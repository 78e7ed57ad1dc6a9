//! `jktdocs-auth`: the authorization core (zero-trust gate).
//!
//! Credential verification, subject resolution and the permission decision,
//! plus the root-record and path-containment guards used by management
//! operations. No HTTP or storage code lives here.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod locator;
pub mod password;
pub mod permissions;
pub mod pipeline;
pub mod resolver;
pub mod roles;
pub mod root;
pub mod subject;
pub mod verifier;

pub use authorize::{
    AuthorizationDecision, AuthorizationExplanation, RequiredPermission, authorize, evaluate,
    explain_authorization,
};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::{AuthError, AuthErrorKind};
pub use locator::DocumentLocator;
pub use password::{hash_password, verify_password};
pub use permissions::{Action, Module, PermissionFlags, PermissionMap};
pub use pipeline::{AuthorizationPipeline, Authorized, Resolved, Verified};
pub use resolver::{StoreError, SubjectResolver, SubjectStore};
pub use roles::Role;
pub use root::{ConfiguredRoot, NameCollation, RootIdentity, ensure_available, guard_role_target, guard_subject_target};
pub use subject::Subject;
pub use verifier::{CredentialVerifier, JwtIssuer, JwtVerifier, TokenAlgorithm, extract_bearer};
