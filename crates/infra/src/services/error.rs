use thiserror::Error;

use jktdocs_auth::{AuthError, StoreError};
use jktdocs_core::DomainError;

/// Failure of a management operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Authorization-core outcome (forbidden, not found, already exists, ...).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Input validation failure (deterministic).
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unknown email or wrong password; never says which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Reading or writing a document body failed.
    #[error("document storage failure: {0}")]
    Io(String),
}

impl ServiceError {
    pub fn not_found(msg: &str) -> Self {
        Self::Auth(AuthError::not_found(msg))
    }

    pub fn already_exists(msg: &str) -> Self {
        Self::Auth(AuthError::already_exists(msg))
    }
}
