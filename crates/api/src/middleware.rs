use axum::{
    extract::State,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use jktdocs_auth::AuthorizationPipeline;

use crate::app::errors;
use crate::context::SubjectContext;

#[derive(Clone)]
pub struct AuthState {
    pub pipeline: AuthorizationPipeline,
}

/// Verify the bearer token and resolve the subject; 401 on any failure.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // A non-UTF-8 header counts as missing.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let resolved = match state.pipeline.verify(header.as_deref(), Utc::now()) {
        Ok(verified) => state.pipeline.resolve(verified).await,
        Err(e) => Err(e),
    };

    match resolved {
        Ok(resolved) => {
            req.extensions_mut().insert(SubjectContext::new(resolved));
            next.run(req).await
        }
        Err(e) => errors::auth_error_to_response(&e),
    }
}
