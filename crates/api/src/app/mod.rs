//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, authorization pipeline and management services
//! - `routes/`: HTTP routes + handlers (one file per module)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build services from configuration, then the router.
pub async fn build_app_from_config(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app(Arc::new(services)))
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        pipeline: services.pipeline.clone(),
    };

    // Protected routes: verified token + resolved subject.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
