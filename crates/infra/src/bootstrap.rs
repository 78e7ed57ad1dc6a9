//! Startup seeding of the root role and root account.

use chrono::Utc;

use jktdocs_auth::{NameCollation, PermissionMap};
use jktdocs_core::{RoleId, UserId};

use crate::services::{ROLE_NOT_FOUND, ServiceError, hash_blocking};
use crate::store::{RoleRecord, RoleStore, UserRecord, UserStore, WriteOutcome};

/// Root account settings, as configured.
#[derive(Debug, Clone)]
pub struct RootAccount {
    pub role_name: String,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Ensure the root role (every module `1111`) and the root account exist.
///
/// Idempotent: existing records are left as they are.
pub async fn seed_root_account(
    roles: &dyn RoleStore,
    users: &dyn UserStore,
    account: &RootAccount,
) -> Result<RoleId, ServiceError> {
    let now = Utc::now();

    let role_id = match roles
        .find_role_by_name(&account.role_name, NameCollation::CaseSensitive)
        .await?
    {
        Some(role) => role.id,
        None => {
            let role = RoleRecord {
                id: RoleId::new(),
                name: account.role_name.clone(),
                permissions: PermissionMap::full(),
                created_at: now,
                updated_at: now,
            };
            match roles.insert_role(role.clone(), NameCollation::CaseSensitive).await? {
                WriteOutcome::Written => {
                    tracing::info!(role_id = %role.id, name = %role.name, "root role seeded");
                    role.id
                }
                // Seeded concurrently; keep the stored record.
                _ => roles
                    .find_role_by_name(&account.role_name, NameCollation::CaseSensitive)
                    .await?
                    .map(|r| r.id)
                    .ok_or_else(|| ServiceError::not_found(ROLE_NOT_FOUND))?,
            }
        }
    };

    if users
        .find_user_by_email(&account.email, NameCollation::CaseSensitive)
        .await?
        .is_none()
    {
        let user = UserRecord {
            id: UserId::new(),
            name: account.name.clone(),
            email: account.email.clone(),
            password_hash: hash_blocking(account.password.clone()).await?,
            phone: None,
            role_id,
            created_at: now,
            updated_at: now,
        };
        if users.insert_user(user.clone(), NameCollation::CaseSensitive).await? == WriteOutcome::Written {
            tracing::info!(user_id = %user.id, "root account seeded");
        }
    }

    Ok(role_id)
}
