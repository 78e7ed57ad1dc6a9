use jktdocs_auth::{Resolved, Subject};

/// Authenticated subject for a request.
///
/// Inserted by the auth middleware once the token is verified and the
/// subject (with its role) is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectContext {
    resolved: Resolved,
}

impl SubjectContext {
    pub fn new(resolved: Resolved) -> Self {
        Self { resolved }
    }

    pub fn subject(&self) -> &Subject {
        &self.resolved.subject
    }

    pub fn resolved(&self) -> Resolved {
        self.resolved.clone()
    }
}
