use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Multipart, Path, Query},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};

use jktdocs_auth::{Authorized, Module};
use jktdocs_core::{DocumentId, UserId};
use jktdocs_infra::services::UploadedFile;

use crate::app::{dto, errors, services::AppServices};
use crate::authz;

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_documents))
        .route("/upload", post(upload_document))
        .route("/image/:id", get(stream_document))
        .route("/:id", get(get_document).delete(delete_document))
        .route_layer(axum::middleware::from_fn_with_state(Module::Document, authz::require))
}

/// POST /documents/upload - multipart upload owned by the caller
pub async fn upload_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(authorized): Extension<Authorized>,
    mut multipart: Multipart,
) -> axum::response::Response {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", e.body_text()),
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        match field.bytes().await {
            Ok(bytes) => {
                upload = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                })
            }
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", e.body_text()),
        }
    }

    let Some(file) = upload else {
        return errors::json_error(StatusCode::BAD_REQUEST, "invalid_upload", "missing 'file' field");
    };

    match services.documents.upload(authorized.subject.id, file).await {
        Ok(doc) => (StatusCode::CREATED, Json(doc)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::DocumentListQuery>,
) -> axum::response::Response {
    let owner: Option<UserId> = match query.user_id.as_deref().map(errors::parse_id::<UserId>).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.documents.list(owner, query.page_request()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /documents/:id - metadata only
pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.documents.get(id).await {
        Ok(doc) => (StatusCode::OK, Json(doc)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// GET /documents/image/:id - the stored bytes, inline
pub async fn stream_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let (doc, bytes) = match services.documents.open(id).await {
        Ok(v) => v,
        Err(e) => return errors::service_error_to_response(e),
    };

    let disposition = format!("inline; filename=\"{}\"", doc.name.replace(['"', '\\', '\r', '\n'], "_"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, doc.mimetype),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        bytes,
    )
        .into_response()
}

pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: DocumentId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.documents.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
