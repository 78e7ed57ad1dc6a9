//! Infrastructure layer: stores, management services, bootstrap.

pub mod bootstrap;
pub mod pagination;
pub mod services;
pub mod store;

pub use bootstrap::{RootAccount, seed_root_account};
pub use pagination::{Page, PageMeta, PageRequest, SortBy, SortOrder, Sortable};
pub use services::{AuthService, DocumentService, RoleService, ServiceError, UserService};
pub use store::{
    DocumentRecord, DocumentStore, InMemoryStore, RoleRecord, RoleStore, UserRecord, UserStore, WriteOutcome,
};
