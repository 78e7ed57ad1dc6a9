//! Per-module permission gate.
//!
//! Each module router is wrapped with [`require`] keyed by its [`Module`];
//! the request method picks the action. Routes outside any module router
//! declare nothing and are allowed for every resolved subject.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use jktdocs_auth::{AuthError, AuthorizationPipeline, Authorized, Module};

use crate::app::errors;
use crate::context::SubjectContext;

/// On success the [`Authorized`] stage is stored in the request extensions.
pub async fn require(State(module): State<Module>, mut req: Request, next: Next) -> Response {
    // Runs behind the auth middleware; no subject means the stack is misassembled.
    let Some(ctx) = req.extensions().get::<SubjectContext>().cloned() else {
        tracing::error!(module = %module, "module gate reached without a resolved subject");
        return errors::auth_error_to_response(&AuthError::Unauthorized);
    };

    match AuthorizationPipeline::decide(ctx.resolved(), Some(module), req.method().as_str()) {
        Ok(authorized) => {
            if let Some(required) = &authorized.required {
                tracing::debug!(subject_id = %authorized.subject.id, %required, "request allowed");
            }
            req.extensions_mut().insert::<Authorized>(authorized);
            next.run(req).await
        }
        Err(e) => errors::auth_error_to_response(&e),
    }
}
