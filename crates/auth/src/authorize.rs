//! Authorization decision engine.

use serde::Serialize;

use jktdocs_core::UserId;

use crate::error::AuthError;
use crate::permissions::{Action, Module};
use crate::subject::Subject;

/// Permission an operation requires: one module, one action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequiredPermission {
    pub module: Module,
    pub action: Action,
}

impl RequiredPermission {
    pub fn new(module: Module, action: Action) -> Self {
        Self { module, action }
    }

    /// Combine the statically declared module with the attempted method.
    ///
    /// A method outside the CRUD mapping cannot be granted, so it is denied
    /// for any gated module.
    pub fn from_method(module: Module, method: &str) -> Result<Self, AuthError> {
        let action = Action::from_method(method).ok_or_else(|| module_denied(module))?;
        Ok(Self { module, action })
    }
}

impl core::fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

/// Outcome of evaluating a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuthorizationDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn into_result(self) -> Result<Self, AuthError> {
        if self.allowed {
            Ok(self)
        } else {
            Err(AuthError::Forbidden(self.reason.unwrap_or_default()))
        }
    }
}

fn module_denied(module: Module) -> AuthError {
    AuthError::Forbidden(denial_message(module))
}

fn denial_message(module: Module) -> String {
    format!("Unauthorized {} module", module.as_str().to_lowercase())
}

/// Evaluate a subject against an operation's declared permission.
///
/// - No IO
/// - No panics
/// - `None` (nothing declared) is ALLOW: only operations tagged with a module are gated.
pub fn evaluate(subject: &Subject, required: Option<&RequiredPermission>) -> AuthorizationDecision {
    let Some(required) = required else {
        return AuthorizationDecision::allow();
    };

    if subject.role.allows(required.module, required.action) {
        AuthorizationDecision::allow()
    } else {
        AuthorizationDecision::deny(denial_message(required.module))
    }
}

/// [`evaluate`], with a deny turned into `AuthError::Forbidden`.
pub fn authorize(
    subject: &Subject,
    required: Option<&RequiredPermission>,
) -> Result<AuthorizationDecision, AuthError> {
    evaluate(subject, required).into_result()
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: Option<RequiredPermission>,
    pub granted: bool,
    pub reason: String,
    pub subject: SubjectState,
}

/// What the engine saw of the subject.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectState {
    pub subject_id: UserId,
    pub role: String,
    /// Effective flags per module, after fail-closed normalization.
    pub effective_permissions: Vec<ModuleFlags>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleFlags {
    pub module: Module,
    pub stored: Option<String>,
    pub effective: String,
}

/// Explain why a request would be allowed or denied.
pub fn explain_authorization(
    subject: &Subject,
    required: Option<&RequiredPermission>,
) -> AuthorizationExplanation {
    let decision = evaluate(subject, required);

    let effective_permissions = Module::ALL
        .iter()
        .map(|module| ModuleFlags {
            module: *module,
            stored: subject.role.permissions.raw(*module).map(str::to_string),
            effective: subject.role.permissions.flags(*module).as_string(),
        })
        .collect();

    let reason = match (required, decision.allowed) {
        (None, _) => "No permission declared for this operation; allowed by default".to_string(),
        (Some(req), true) => format!(
            "Role '{}' grants {} on module {}",
            subject.role.name, req.action, req.module
        ),
        (Some(req), false) => {
            let stored = subject.role.permissions.raw(req.module);
            match stored {
                None => format!(
                    "Role '{}' has no entry for module {}; treated as 0000",
                    subject.role.name, req.module
                ),
                Some(raw) if crate::permissions::PermissionFlags::parse(raw).is_err() => format!(
                    "Role '{}' has malformed flags '{}' for module {}; treated as 0000",
                    subject.role.name, raw, req.module
                ),
                Some(raw) => format!(
                    "Role '{}' flags '{}' for module {} do not grant {}",
                    subject.role.name, raw, req.module, req.action
                ),
            }
        }
    };

    AuthorizationExplanation {
        required_permission: required.copied(),
        granted: decision.allowed,
        reason,
        subject: SubjectState {
            subject_id: subject.id,
            role: subject.role.name.clone(),
            effective_permissions,
        },
    }
}
