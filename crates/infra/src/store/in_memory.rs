use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use jktdocs_auth::{NameCollation, StoreError, Subject, SubjectStore};
use jktdocs_core::{DocumentId, RoleId, UserId};

use super::{DocumentRecord, DocumentStore, RoleRecord, RoleStore, UserRecord, UserStore, WriteOutcome};

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    roles: RwLock<HashMap<RoleId, RoleRecord>>,
    users: RwLock<HashMap<UserId, UserRecord>>,
    documents: RwLock<HashMap<DocumentId, DocumentRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StoreError> {
    lock.read().map_err(|_| StoreError::new("lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StoreError> {
    lock.write().map_err(|_| StoreError::new("lock poisoned"))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn insert_role(&self, role: RoleRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError> {
        let mut roles = write(&self.roles)?;
        if roles.values().any(|r| collation.matches(&r.name, &role.name)) {
            return Ok(WriteOutcome::Conflict);
        }
        roles.insert(role.id, role);
        Ok(WriteOutcome::Written)
    }

    async fn get_role(&self, id: RoleId) -> Result<Option<RoleRecord>, StoreError> {
        Ok(read(&self.roles)?.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str, collation: NameCollation) -> Result<Option<RoleRecord>, StoreError> {
        Ok(read(&self.roles)?
            .values()
            .find(|r| collation.matches(&r.name, name))
            .cloned())
    }

    async fn list_roles(&self, search: Option<&str>) -> Result<Vec<RoleRecord>, StoreError> {
        let mut roles: Vec<RoleRecord> = read(&self.roles)?
            .values()
            .filter(|r| search.is_none_or(|s| contains_ci(&r.name, s)))
            .cloned()
            .collect();
        roles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(roles)
    }

    async fn update_role(&self, role: RoleRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError> {
        let mut roles = write(&self.roles)?;
        if !roles.contains_key(&role.id) {
            return Ok(WriteOutcome::Missing);
        }
        if roles
            .values()
            .any(|r| r.id != role.id && collation.matches(&r.name, &role.name))
        {
            return Ok(WriteOutcome::Conflict);
        }
        roles.insert(role.id, role);
        Ok(WriteOutcome::Written)
    }

    async fn delete_role(&self, id: RoleId) -> Result<bool, StoreError> {
        Ok(write(&self.roles)?.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: UserRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| collation.matches(&u.email, &user.email)) {
            return Ok(WriteOutcome::Conflict);
        }
        users.insert(user.id, user);
        Ok(WriteOutcome::Written)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(read(&self.users)?.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str, collation: NameCollation) -> Result<Option<UserRecord>, StoreError> {
        Ok(read(&self.users)?
            .values()
            .find(|u| collation.matches(&u.email, email))
            .cloned())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, StoreError> {
        let mut users: Vec<UserRecord> = read(&self.users)?
            .values()
            .filter(|u| {
                search.is_none_or(|s| {
                    contains_ci(&u.name, s)
                        || contains_ci(&u.email, s)
                        || u.phone.as_deref().is_some_and(|p| contains_ci(p, s))
                })
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn update_user(&self, user: UserRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError> {
        let mut users = write(&self.users)?;
        if !users.contains_key(&user.id) {
            return Ok(WriteOutcome::Missing);
        }
        if users
            .values()
            .any(|u| u.id != user.id && collation.matches(&u.email, &user.email))
        {
            return Ok(WriteOutcome::Conflict);
        }
        users.insert(user.id, user);
        Ok(WriteOutcome::Written)
    }

    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(write(&self.users)?.remove(&id).is_some())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_document(&self, doc: DocumentRecord) -> Result<(), StoreError> {
        write(&self.documents)?.insert(doc.id, doc);
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError> {
        Ok(read(&self.documents)?.get(&id).cloned())
    }

    async fn list_documents(&self, owner: Option<UserId>) -> Result<Vec<DocumentRecord>, StoreError> {
        let mut docs: Vec<DocumentRecord> = read(&self.documents)?
            .values()
            .filter(|d| owner.is_none() || d.user_id == owner)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(docs)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool, StoreError> {
        Ok(write(&self.documents)?.remove(&id).is_some())
    }
}

#[async_trait]
impl SubjectStore for InMemoryStore {
    async fn load_subject_with_role(&self, id: UserId) -> Result<Option<Subject>, StoreError> {
        let Some(user) = read(&self.users)?.get(&id).cloned() else {
            return Ok(None);
        };
        let Some(role) = read(&self.roles)?.get(&user.role_id).map(RoleRecord::to_role) else {
            return Ok(None);
        };

        Ok(Some(Subject {
            id: user.id,
            email: user.email,
            name: user.name,
            role,
        }))
    }
}
