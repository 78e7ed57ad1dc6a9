use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use jktdocs_auth::{Action, NameCollation, PermissionMap, RootIdentity, ensure_available, guard_role_target};
use jktdocs_core::{DomainError, RoleId};

use super::{ROLE_ALREADY_EXIST, ROLE_NOT_FOUND, ServiceError};
use crate::pagination::{Page, PageRequest};
use crate::store::{RoleRecord, RoleStore, WriteOutcome};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub permissions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub permissions: Option<BTreeMap<String, String>>,
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("role name is required"));
    }
    Ok(name.to_string())
}

#[derive(Clone)]
pub struct RoleService {
    store: Arc<dyn RoleStore>,
    root: Arc<dyn RootIdentity>,
    collation: NameCollation,
}

impl RoleService {
    pub fn new(store: Arc<dyn RoleStore>, root: Arc<dyn RootIdentity>, collation: NameCollation) -> Self {
        Self { store, root, collation }
    }

    async fn existing(&self, id: RoleId) -> Result<RoleRecord, ServiceError> {
        self.store
            .get_role(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ROLE_NOT_FOUND))
    }

    pub async fn create(&self, input: CreateRole) -> Result<RoleRecord, ServiceError> {
        let name = validate_name(&input.name)?;
        let permissions = PermissionMap::parse_strict(&input.permissions)?;

        let clash = self.store.find_role_by_name(&name, self.collation).await?;
        ensure_available(clash.as_ref().map(|r| &r.id), None, ROLE_ALREADY_EXIST)?;

        let now = Utc::now();
        let role = RoleRecord {
            id: RoleId::new(),
            name,
            permissions,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_role(role.clone(), self.collation).await? {
            WriteOutcome::Written => {}
            WriteOutcome::Conflict => return Err(ServiceError::already_exists(ROLE_ALREADY_EXIST)),
            WriteOutcome::Missing => return Err(ServiceError::not_found(ROLE_NOT_FOUND)),
        }

        tracing::info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    /// Paginated listing; the root role never appears.
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<RoleRecord>, ServiceError> {
        let mut roles: Vec<RoleRecord> = self
            .store
            .list_roles(search)
            .await?
            .into_iter()
            .filter(|r| !self.root.is_root_role(&r.to_role()))
            .collect();
        page.sort(&mut roles);
        Ok(Page::from_items(roles, page))
    }

    pub async fn get(&self, id: RoleId) -> Result<RoleRecord, ServiceError> {
        let role = self.existing(id).await?;
        guard_role_target(self.root.as_ref(), &role.to_role(), Action::Read)?;
        Ok(role)
    }

    pub async fn update(&self, id: RoleId, input: UpdateRole) -> Result<RoleRecord, ServiceError> {
        let name = input.name.as_deref().map(validate_name).transpose()?;
        let permissions = input
            .permissions
            .as_ref()
            .map(PermissionMap::parse_strict)
            .transpose()?;

        let mut role = self.existing(id).await?;
        guard_role_target(self.root.as_ref(), &role.to_role(), Action::Update)?;

        if let Some(name) = &name {
            let clash = self.store.find_role_by_name(name, self.collation).await?;
            ensure_available(clash.as_ref().map(|r| &r.id), Some(&id), ROLE_ALREADY_EXIST)?;
        }

        if let Some(name) = name {
            role.name = name;
        }
        if let Some(permissions) = permissions {
            role.permissions = permissions;
        }
        role.updated_at = Utc::now();

        match self.store.update_role(role.clone(), self.collation).await? {
            WriteOutcome::Written => {}
            WriteOutcome::Conflict => return Err(ServiceError::already_exists(ROLE_ALREADY_EXIST)),
            WriteOutcome::Missing => return Err(ServiceError::not_found(ROLE_NOT_FOUND)),
        }

        tracing::info!(role_id = %role.id, "role updated");
        Ok(role)
    }

    pub async fn delete(&self, id: RoleId) -> Result<(), ServiceError> {
        let role = self.existing(id).await?;
        guard_role_target(self.root.as_ref(), &role.to_role(), Action::Delete)?;

        if !self.store.delete_role(id).await? {
            return Err(ServiceError::not_found(ROLE_NOT_FOUND));
        }

        tracing::info!(role_id = %id, "role deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jktdocs_auth::{AuthError, ConfiguredRoot, Module};

    use super::*;
    use crate::pagination::{SortBy, SortOrder};
    use crate::store::InMemoryStore;

    fn perms(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn service(collation: NameCollation) -> (RoleService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let root = Arc::new(ConfiguredRoot::new("admin", "admin@jkt.local"));
        (RoleService::new(store.clone(), root, collation), store)
    }

    async fn seed_root(store: &InMemoryStore) -> RoleRecord {
        let now = Utc::now();
        let root = RoleRecord {
            id: RoleId::new(),
            name: "admin".to_string(),
            permissions: PermissionMap::full(),
            created_at: now,
            updated_at: now,
        };
        store.insert_role(root.clone(), NameCollation::CaseSensitive).await.unwrap();
        root
    }

    #[tokio::test]
    async fn create_then_get() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        let created = svc
            .create(CreateRole {
                name: "Ops".to_string(),
                permissions: perms(&[("USER", "0100"), ("DOCUMENT", "1111")]),
            })
            .await
            .unwrap();

        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "Ops");
        assert!(fetched.permissions.allows(Module::Document, jktdocs_auth::Action::Delete));
    }

    #[tokio::test]
    async fn duplicate_name_is_already_exists() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        let input = CreateRole {
            name: "Ops".to_string(),
            permissions: perms(&[]),
        };
        svc.create(input.clone()).await.unwrap();

        assert_eq!(
            svc.create(input).await.unwrap_err(),
            ServiceError::Auth(AuthError::AlreadyExists(ROLE_ALREADY_EXIST.to_string()))
        );
    }

    #[tokio::test]
    async fn different_case_is_distinct_under_case_sensitive_collation() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        svc.create(CreateRole { name: "Ops".to_string(), permissions: perms(&[]) })
            .await
            .unwrap();
        assert!(svc
            .create(CreateRole { name: "ops".to_string(), permissions: perms(&[]) })
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn different_case_collides_under_case_insensitive_collation() {
        let (svc, _) = service(NameCollation::CaseInsensitive);
        svc.create(CreateRole { name: "Ops".to_string(), permissions: perms(&[]) })
            .await
            .unwrap();
        let err = svc
            .create(CreateRole { name: "ops".to_string(), permissions: perms(&[]) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn malformed_flags_are_rejected_before_lookup() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        let err = svc
            .create(CreateRole {
                name: "Broken".to_string(),
                permissions: perms(&[("USER", "12")]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn root_role_is_untouchable_and_hidden() {
        let (svc, store) = service(NameCollation::CaseSensitive);
        let root = seed_root(&store).await;

        assert!(matches!(svc.get(root.id).await, Err(ServiceError::Auth(AuthError::Forbidden(_)))));
        assert!(matches!(
            svc.update(root.id, UpdateRole { name: Some("x".to_string()), ..Default::default() }).await,
            Err(ServiceError::Auth(AuthError::Forbidden(_)))
        ));
        assert!(matches!(svc.delete(root.id).await, Err(ServiceError::Auth(AuthError::Forbidden(_)))));

        // Nothing was mutated.
        assert_eq!(store.get_role(root.id).await.unwrap(), Some(root));

        let page = svc.list(None, PageRequest::default()).await.unwrap();
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn rename_onto_existing_name_fails_but_keeping_own_name_succeeds() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        let ops = svc.create(CreateRole { name: "Ops".to_string(), permissions: perms(&[]) }).await.unwrap();
        svc.create(CreateRole { name: "Audit".to_string(), permissions: perms(&[]) }).await.unwrap();

        let err = svc
            .update(ops.id, UpdateRole { name: Some("Audit".to_string()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::AlreadyExists(_))));

        let updated = svc
            .update(
                ops.id,
                UpdateRole {
                    name: Some("Ops".to_string()),
                    permissions: Some(perms(&[("ROLE", "0100")])),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.permissions.raw(Module::Role), Some("0100"));
    }

    #[tokio::test]
    async fn missing_role_is_not_found() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        assert_eq!(
            svc.delete(RoleId::new()).await.unwrap_err(),
            ServiceError::not_found(ROLE_NOT_FOUND)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_one_name_store_one_role() {
        let (svc, store) = service(NameCollation::CaseSensitive);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.create(CreateRole { name: "Ops".to_string(), permissions: perms(&[]) })
                        .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, ServiceError::Auth(AuthError::AlreadyExists(_)))),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_roles(Some("Ops")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_sorts_by_name_when_asked() {
        let (svc, _) = service(NameCollation::CaseSensitive);
        for name in ["Beta", "Alpha", "Gamma"] {
            svc.create(CreateRole { name: name.to_string(), permissions: perms(&[]) }).await.unwrap();
        }

        let page = PageRequest::new(Some(1), Some(10), Some(SortOrder::Asc)).sorted_by(Some(SortBy::Name));
        let names: Vec<_> = svc.list(None, page).await.unwrap().data.into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Alpha", "Beta", "Gamma"]);
    }
}
