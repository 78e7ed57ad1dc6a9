//! Management operations over users, roles and documents, plus login.
//!
//! Every operation that targets a record by id runs, in order: input
//! validation, record lookup (`NotFound`), root protection (`Forbidden`),
//! uniqueness (`AlreadyExists`), and only then the mutation.

pub mod documents;
pub mod error;
pub mod login;
pub mod roles;
pub mod users;

pub use documents::{DocumentService, UploadedFile};
pub use error::ServiceError;
pub use login::{AuthService, LoginOutcome};
pub use roles::{CreateRole, RoleService, UpdateRole};
pub use users::{CreateUser, UpdateUser, UserService};

pub const ROLE_ALREADY_EXIST: &str = "Role Already Exists";
pub const ROLE_NOT_FOUND: &str = "Role Not Found";
pub const USER_ALREADY_EXIST: &str = "User already exists";
pub const USER_NOT_FOUND: &str = "User Not Found";

/// Argon2 hashing on the blocking pool.
pub(crate) async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    let hash = tokio::task::spawn_blocking(move || jktdocs_auth::hash_password(&password))
        .await
        .map_err(|e| jktdocs_auth::AuthError::internal(format!("password hashing task failed: {e}")))??;
    Ok(hash)
}

/// Argon2 verification on the blocking pool.
pub(crate) async fn verify_blocking(hash: String, password: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || jktdocs_auth::verify_password(&hash, &password))
        .await
        .map_err(|e| jktdocs_auth::AuthError::internal(format!("password verification task failed: {e}")).into())
}
