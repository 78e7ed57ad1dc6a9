//! Persistence seams for users, roles and documents.
//!
//! The authorization core only reads through [`jktdocs_auth::SubjectStore`];
//! these traits serve the management services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jktdocs_auth::{NameCollation, PermissionMap, Role, StoreError};
use jktdocs_core::{DocumentId, RoleId, UserId};

use crate::pagination::Sortable;

pub mod in_memory;

pub use in_memory::InMemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub permissions: PermissionMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoleRecord {
    pub fn to_role(&self) -> Role {
        Role::new(self.id, self.name.clone(), self.permissions.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub name: String,
    pub url: String,
    pub mimetype: String,
    pub size: u64,
    /// Filesystem location as recorded at upload time. Untrusted on read.
    pub path: String,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

macro_rules! impl_sortable {
    ($($t:ty),+) => {
        $(
            impl Sortable for $t {
                fn sort_name(&self) -> &str {
                    &self.name
                }

                fn sort_created_at(&self) -> DateTime<Utc> {
                    self.created_at
                }
            }
        )+
    };
}

impl_sortable!(RoleRecord, UserRecord, DocumentRecord);

/// Result of a write guarded by a uniqueness constraint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// Update target does not exist.
    Missing,
    /// Another record already holds the unique name/email.
    Conflict,
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Insert unless another role's name matches under `collation`; check and write are atomic.
    async fn insert_role(&self, role: RoleRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError>;
    async fn get_role(&self, id: RoleId) -> Result<Option<RoleRecord>, StoreError>;
    async fn find_role_by_name(&self, name: &str, collation: NameCollation) -> Result<Option<RoleRecord>, StoreError>;
    /// Roles whose name contains `search` (case-insensitive), newest first.
    async fn list_roles(&self, search: Option<&str>) -> Result<Vec<RoleRecord>, StoreError>;
    /// Replace an existing role, with the same name constraint as [`insert_role`](Self::insert_role).
    async fn update_role(&self, role: RoleRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError>;
    async fn delete_role(&self, id: RoleId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert unless another user's email matches under `collation`; check and write are atomic.
    async fn insert_user(&self, user: UserRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;
    async fn find_user_by_email(&self, email: &str, collation: NameCollation) -> Result<Option<UserRecord>, StoreError>;
    /// Users whose name, email or phone contains `search` (case-insensitive), newest first.
    async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserRecord>, StoreError>;
    async fn update_user(&self, user: UserRecord, collation: NameCollation) -> Result<WriteOutcome, StoreError>;
    async fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, doc: DocumentRecord) -> Result<(), StoreError>;
    async fn get_document(&self, id: DocumentId) -> Result<Option<DocumentRecord>, StoreError>;
    /// Documents, optionally of one owner, newest first.
    async fn list_documents(&self, owner: Option<UserId>) -> Result<Vec<DocumentRecord>, StoreError>;
    async fn delete_document(&self, id: DocumentId) -> Result<bool, StoreError>;
}
