use serde::Serialize;

use jktdocs_core::{RoleId, UserId};

use crate::roles::Role;

/// The acting user of a request, with its role resolved.
///
/// Lives for one request only and is never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Subject {
    pub fn role_id(&self) -> RoleId {
        self.role.id
    }
}
