use serde::{Deserialize, Serialize};

use jktdocs_core::RoleId;

use crate::permissions::{Action, Module, PermissionMap};

/// A role record with its per-module permission strings.
///
/// Read-only from the authorization core's point of view; roles are created
/// and changed by management operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: PermissionMap,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<String>, permissions: PermissionMap) -> Self {
        Self {
            id,
            name: name.into(),
            permissions,
        }
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.permissions.allows(module, action)
    }
}
