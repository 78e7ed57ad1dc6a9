//! Failure kinds of the authorization pipeline.

use serde::Serialize;
use thiserror::Error;

/// Every failure the authorization core can produce.
///
/// `Unauthorized` carries no detail: a missing header, a bad
/// signature, an expired token and a vanished subject all look the same to
/// the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AuthError`], stable for logging/tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    Unauthorized,
    Forbidden,
    NotFound,
    AlreadyExists,
    Internal,
}

impl AuthError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::Unauthorized => AuthErrorKind::Unauthorized,
            AuthError::Forbidden(_) => AuthErrorKind::Forbidden,
            AuthError::NotFound(_) => AuthErrorKind::NotFound,
            AuthError::AlreadyExists(_) => AuthErrorKind::AlreadyExists,
            AuthError::Internal(_) => AuthErrorKind::Internal,
        }
    }
}
