use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use jktdocs_auth::{AuthError, StoreError};
use jktdocs_core::DomainError;
use jktdocs_infra::ServiceError;

/// The JSON `error` code equals the serialized [`AuthError::kind`], except
/// `Internal`, which answers `internal_error`.
pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    tracing::debug!(kind = ?err.kind(), "request rejected");
    match err {
        AuthError::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string()),
        AuthError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg.clone()),
        AuthError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg.clone()),
        AuthError::AlreadyExists(msg) => json_error(StatusCode::BAD_REQUEST, "already_exists", msg.clone()),
        AuthError::Internal(msg) => {
            tracing::error!(error = %msg, "internal authorization failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Auth(e) => auth_error_to_response(&e),
        ServiceError::Domain(e) => domain_error_to_response(e),
        ServiceError::Store(StoreError(msg)) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
        ServiceError::InvalidCredentials => {
            json_error(StatusCode::BAD_REQUEST, "invalid_credentials", "Invalid credentials")
        }
        ServiceError::Io(msg) => {
            tracing::error!(error = %msg, "document storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", "internal error")
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn auth_error_code_is_its_kind() {
        for (err, status) in [
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::forbidden("Unauthorized user module"), StatusCode::FORBIDDEN),
            (AuthError::not_found("User Not Found"), StatusCode::NOT_FOUND),
            (AuthError::already_exists("Role Already Exists"), StatusCode::BAD_REQUEST),
        ] {
            let resp = auth_error_to_response(&err);
            assert_eq!(resp.status(), status);
            assert_eq!(body(resp).await["error"], serde_json::to_value(err.kind()).unwrap());
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let resp = auth_error_to_response(&AuthError::internal("key material unreadable"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body(resp).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "internal error");
    }
}
