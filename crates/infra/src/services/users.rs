use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use jktdocs_auth::{Action, NameCollation, RootIdentity, ensure_available, guard_subject_target};
use jktdocs_core::{DomainError, RoleId, UserId};

use super::{ROLE_NOT_FOUND, ServiceError, USER_ALREADY_EXIST, USER_NOT_FOUND, hash_blocking};
use crate::pagination::{Page, PageRequest};
use crate::store::{RoleStore, UserRecord, UserStore, WriteOutcome};

pub const USER_MIN_PASSWORD_SIZE: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role_id: RoleId,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<RoleId>,
}

fn validate_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("Name must be at least '1 characters long."));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid {
        return Err(DomainError::validation("Please provide a valid email address."));
    }
    Ok(email.to_string())
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    root: Arc<dyn RootIdentity>,
    collation: NameCollation,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        root: Arc<dyn RootIdentity>,
        collation: NameCollation,
    ) -> Self {
        Self {
            users,
            roles,
            root,
            collation,
        }
    }

    async fn existing(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))
    }

    async fn ensure_role_exists(&self, id: RoleId) -> Result<(), ServiceError> {
        match self.roles.get_role(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(ROLE_NOT_FOUND)),
        }
    }

    pub async fn create(&self, input: CreateUser) -> Result<UserRecord, ServiceError> {
        let name = validate_name(&input.name)?;
        let email = validate_email(&input.email)?;
        if input.password.chars().count() < USER_MIN_PASSWORD_SIZE {
            return Err(DomainError::validation(format!(
                "Password must be at least '{USER_MIN_PASSWORD_SIZE} characters long."
            ))
            .into());
        }

        let password_hash = hash_blocking(input.password).await?;

        let clash = self.users.find_user_by_email(&email, self.collation).await?;
        ensure_available(clash.as_ref().map(|u| &u.id), None, USER_ALREADY_EXIST)?;
        self.ensure_role_exists(input.role_id).await?;

        let now = Utc::now();
        let user = UserRecord {
            id: UserId::new(),
            name,
            email,
            password_hash,
            phone: input.phone,
            role_id: input.role_id,
            created_at: now,
            updated_at: now,
        };
        match self.users.insert_user(user.clone(), self.collation).await? {
            WriteOutcome::Written => {}
            WriteOutcome::Conflict => return Err(ServiceError::already_exists(USER_ALREADY_EXIST)),
            WriteOutcome::Missing => return Err(ServiceError::not_found(USER_NOT_FOUND)),
        }

        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Paginated listing; the root account never appears.
    pub async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<UserRecord>, ServiceError> {
        let mut users: Vec<UserRecord> = self
            .users
            .list_users(search)
            .await?
            .into_iter()
            .filter(|u| !self.root.is_root_subject(&u.email))
            .collect();
        page.sort(&mut users);
        Ok(Page::from_items(users, page))
    }

    pub async fn get(&self, id: UserId) -> Result<UserRecord, ServiceError> {
        let user = self.existing(id).await?;
        guard_subject_target(self.root.as_ref(), &user.email, Action::Read)?;
        Ok(user)
    }

    pub async fn update(&self, id: UserId, input: UpdateUser) -> Result<UserRecord, ServiceError> {
        let name = input.name.as_deref().map(validate_name).transpose()?;
        let email = input.email.as_deref().map(validate_email).transpose()?;

        let mut user = self.existing(id).await?;
        guard_subject_target(self.root.as_ref(), &user.email, Action::Update)?;

        if let Some(email) = &email {
            let clash = self.users.find_user_by_email(email, self.collation).await?;
            ensure_available(clash.as_ref().map(|u| &u.id), Some(&id), USER_ALREADY_EXIST)?;
        }
        if let Some(role_id) = input.role_id {
            self.ensure_role_exists(role_id).await?;
            user.role_id = role_id;
        }

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if input.phone.is_some() {
            user.phone = input.phone;
        }
        user.updated_at = Utc::now();

        match self.users.update_user(user.clone(), self.collation).await? {
            WriteOutcome::Written => {}
            WriteOutcome::Conflict => return Err(ServiceError::already_exists(USER_ALREADY_EXIST)),
            WriteOutcome::Missing => return Err(ServiceError::not_found(USER_NOT_FOUND)),
        }

        tracing::info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    pub async fn delete(&self, id: UserId) -> Result<(), ServiceError> {
        let user = self.existing(id).await?;
        guard_subject_target(self.root.as_ref(), &user.email, Action::Delete)?;

        if !self.users.delete_user(id).await? {
            return Err(ServiceError::not_found(USER_NOT_FOUND));
        }

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
