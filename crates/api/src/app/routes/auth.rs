use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use jktdocs_auth::{Action, Module, RequiredPermission, explain_authorization};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SubjectContext;

/// POST /auth/login - exchange email + password for a bearer token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.auth.login(&body.email, &body.password, Utc::now()).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(dto::LoginResponse {
                access_token: outcome.token,
                token_type: "Bearer",
                expires_in: services.token_ttl_secs,
                user: outcome.user,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /auth/me - the resolved subject with its role
pub async fn me(Extension(ctx): Extension<SubjectContext>) -> axum::response::Response {
    (StatusCode::OK, Json(ctx.subject().clone())).into_response()
}

/// GET /auth/explain?module=&action= - why the caller would be allowed or denied
pub async fn explain(
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<dto::ExplainQuery>,
) -> axum::response::Response {
    let required = match query.module.as_deref() {
        None => None,
        Some(raw) => {
            let module: Module = match raw.parse() {
                Ok(m) => m,
                Err(e) => return errors::domain_error_to_response(e),
            };
            let action: Action = match query.action.as_deref().unwrap_or("READ").parse() {
                Ok(a) => a,
                Err(e) => return errors::domain_error_to_response(e),
            };
            Some(RequiredPermission::new(module, action))
        }
    };

    let explanation = explain_authorization(ctx.subject(), required.as_ref());
    (StatusCode::OK, Json(explanation)).into_response()
}
