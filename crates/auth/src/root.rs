//! Root-identity protection and name/email uniqueness.
//!
//! These checks apply to management operations that target a role or user
//! record by id. They are independent of the caller's permission bits and
//! must run before any mutation.

use crate::error::AuthError;
use crate::permissions::Action;
use crate::roles::Role;

pub const CANNOT_GET_ADMIN: &str = "Cannot get admin role";
pub const CANNOT_UPDATE_ADMIN: &str = "Cannot update admin roles";
pub const CANNOT_DELETE_ADMIN: &str = "Admin role cannot be deleted";

/// Predicates identifying the distinguished root role and root account.
pub trait RootIdentity: Send + Sync {
    fn is_root_role(&self, role: &Role) -> bool;
    fn is_root_subject(&self, email: &str) -> bool;
}

/// Root identity taken from configuration once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredRoot {
    pub role_name: String,
    pub admin_email: String,
}

impl ConfiguredRoot {
    pub fn new(role_name: impl Into<String>, admin_email: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            admin_email: admin_email.into(),
        }
    }
}

impl RootIdentity for ConfiguredRoot {
    fn is_root_role(&self, role: &Role) -> bool {
        role.name == self.role_name
    }

    fn is_root_subject(&self, email: &str) -> bool {
        email == self.admin_email
    }
}

fn protection_message(action: Action) -> Option<&'static str> {
    match action {
        Action::Create => None,
        Action::Read => Some(CANNOT_GET_ADMIN),
        Action::Update => Some(CANNOT_UPDATE_ADMIN),
        Action::Delete => Some(CANNOT_DELETE_ADMIN),
    }
}

/// Deny reading, updating or deleting the root role.
pub fn guard_role_target(root: &dyn RootIdentity, target: &Role, action: Action) -> Result<(), AuthError> {
    match protection_message(action) {
        Some(msg) if root.is_root_role(target) => {
            tracing::warn!(role_id = %target.id, %action, "attempt on root role refused");
            Err(AuthError::forbidden(msg))
        }
        _ => Ok(()),
    }
}

/// Deny reading, updating or deleting the root account.
pub fn guard_subject_target(root: &dyn RootIdentity, target_email: &str, action: Action) -> Result<(), AuthError> {
    match protection_message(action) {
        Some(msg) if root.is_root_subject(target_email) => {
            tracing::warn!(%action, "attempt on root account refused");
            Err(AuthError::forbidden(msg))
        }
        _ => Ok(()),
    }
}

/// How role names and user emails are compared for uniqueness.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum NameCollation {
    /// `"Ops"` and `"ops"` are distinct.
    #[default]
    CaseSensitive,
    /// `"Ops"` and `"ops"` collide.
    CaseInsensitive,
}

impl NameCollation {
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            NameCollation::CaseSensitive => a == b,
            NameCollation::CaseInsensitive => a.to_lowercase() == b.to_lowercase(),
        }
    }
}

/// Fail with `AlreadyExists` when `clash` is a record other than the one being updated.
pub fn ensure_available<I: PartialEq>(
    clash: Option<&I>,
    updating: Option<&I>,
    message: &str,
) -> Result<(), AuthError> {
    match clash {
        Some(existing) if Some(existing) != updating => Err(AuthError::already_exists(message)),
        _ => Ok(()),
    }
}
