use axum::{Router, routing::get};

pub mod auth;
pub mod documents;
pub mod roles;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
///
/// `/auth/*` declares no module; the others are gated per module.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/explain", get(auth::explain))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/documents", documents::router())
}
