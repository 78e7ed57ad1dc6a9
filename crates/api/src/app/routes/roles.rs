use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use jktdocs_auth::Module;
use jktdocs_core::RoleId;
use jktdocs_infra::services::{CreateRole, UpdateRole};

use crate::app::{dto, errors, services::AppServices};
use crate::authz;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/:id", get(get_role).patch(update_role).put(update_role).delete(delete_role))
        .route_layer(axum::middleware::from_fn_with_state(Module::Role, authz::require))
}

pub async fn create_role(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateRole>,
) -> axum::response::Response {
    match services.roles.create(body).await {
        Ok(role) => (StatusCode::CREATED, Json(role)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_roles(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    match services.roles.list(query.search(), query.page_request()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.roles.get(id).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateRole>,
) -> axum::response::Response {
    let id: RoleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.roles.update(id, body).await {
        Ok(role) => (StatusCode::OK, Json(role)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: RoleId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.roles.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
