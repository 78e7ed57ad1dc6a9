//! Subject resolution: verified subject id → user + role.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use jktdocs_core::UserId;

use crate::error::AuthError;
use crate::subject::Subject;

/// Failure of an external store call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("store unavailable: {0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Store collaborator that can load a user together with its role.
///
/// `Ok(None)` means the user (or its role) no longer exists.
#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn load_subject_with_role(&self, id: UserId) -> Result<Option<Subject>, StoreError>;
}

#[async_trait]
impl<S> SubjectStore for Arc<S>
where
    S: SubjectStore + ?Sized,
{
    async fn load_subject_with_role(&self, id: UserId) -> Result<Option<Subject>, StoreError> {
        (**self).load_subject_with_role(id).await
    }
}

/// Turns a verified subject id into a [`Subject`].
#[derive(Clone)]
pub struct SubjectResolver {
    store: Arc<dyn SubjectStore>,
}

impl SubjectResolver {
    pub fn new(store: Arc<dyn SubjectStore>) -> Self {
        Self { store }
    }

    /// A vanished subject is `Unauthorized`, never `NotFound`, so that a
    /// deleted account cannot be told apart from a bad token.
    pub async fn resolve(&self, id: UserId) -> Result<Subject, AuthError> {
        match self.store.load_subject_with_role(id).await {
            Ok(Some(subject)) => Ok(subject),
            Ok(None) => {
                tracing::debug!(subject_id = %id, "subject no longer resolvable");
                Err(AuthError::Unauthorized)
            }
            Err(e) => {
                tracing::error!(subject_id = %id, error = %e, "subject store failure");
                Err(AuthError::internal(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Minimal in-process store for resolver/pipeline tests.
    #[derive(Default)]
    pub struct MapSubjectStore {
        pub subjects: Mutex<HashMap<UserId, Subject>>,
        pub fail: bool,
    }

    impl MapSubjectStore {
        pub fn with(subject: Subject) -> Self {
            let store = Self::default();
            store.subjects.lock().unwrap().insert(subject.id, subject);
            store
        }

        pub fn remove(&self, id: UserId) {
            self.subjects.lock().unwrap().remove(&id);
        }
    }

    #[async_trait]
    impl SubjectStore for MapSubjectStore {
        async fn load_subject_with_role(&self, id: UserId) -> Result<Option<Subject>, StoreError> {
            if self.fail {
                return Err(StoreError::new("connection refused"));
            }
            Ok(self.subjects.lock().unwrap().get(&id).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use jktdocs_core::RoleId;

    use super::test_support::MapSubjectStore;
    use super::*;
    use crate::permissions::PermissionMap;
    use crate::roles::Role;

    fn subject() -> Subject {
        Subject {
            id: UserId::new(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            role: Role::new(RoleId::new(), "Ops", PermissionMap::new()),
        }
    }

    #[tokio::test]
    async fn resolves_existing_subject() {
        let s = subject();
        let resolver = SubjectResolver::new(Arc::new(MapSubjectStore::with(s.clone())));
        assert_eq!(resolver.resolve(s.id).await.unwrap(), s);
    }

    #[tokio::test]
    async fn removed_subject_is_unauthorized_not_not_found() {
        let s = subject();
        let store = Arc::new(MapSubjectStore::with(s.clone()));
        let resolver = SubjectResolver::new(store.clone());

        store.remove(s.id);
        assert_eq!(resolver.resolve(s.id).await.unwrap_err(), AuthError::Unauthorized);
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let store = MapSubjectStore {
            fail: true,
            ..Default::default()
        };
        let resolver = SubjectResolver::new(Arc::new(store));
        let err = resolver.resolve(UserId::new()).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }
}
