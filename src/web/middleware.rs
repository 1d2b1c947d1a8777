//! `axum` middleware running the write gate in front of mutating routes.
//!
//! # Integration Flow
//!
//! ```text
//! HTTP Request
//!   ↓
//! Upstream layer parses headers, calls attach_context()
//!   ↓
//! require_write_access() evaluates the WriteGate
//!   ↓
//! Allow → next handler
//! Deny  → 401 + error document
//! Error → 500 + generic error document (cause logged)
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    context::RequestContext,
    error::AuthzError,
    gate::{Decision, WriteGate},
    rejection::ErrorDocument,
};

/// Stores `ctx` in the request extensions for [`require_write_access`].
///
/// The context is kept behind `Arc` because credential wrappers are not
/// `Clone`.
pub fn attach_context(request: &mut Request, ctx: RequestContext) {
    request.extensions_mut().insert(Arc::new(ctx));
}

/// Gates a route on [`WriteGate::evaluate`].
///
/// A request with no attached context is evaluated as carrying no
/// credentials, and is therefore rejected unless bypass is on.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use axum::{middleware, routing::post, Router};
/// use sources_authz::{web::require_write_access, AuthzConfig, WriteGate};
///
/// let gate = Arc::new(WriteGate::without_rbac(AuthzConfig::new().with_bypass(true)));
///
/// let app: Router = Router::new()
///     .route("/sources", post(|| async { "created" }))
///     .layer(middleware::from_fn_with_state(gate, require_write_access));
/// ```
pub async fn require_write_access(
    State(gate): State<Arc<WriteGate>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = request
        .extensions()
        .get::<Arc<RequestContext>>()
        .cloned()
        .unwrap_or_default();

    match gate.evaluate(&ctx).await {
        Ok(decision) => match deny_response(decision) {
            Some(rejection) => rejection,
            None => next.run(request).await,
        },
        Err(err) => error_response(&err, ctx.request_id()),
    }
}

/// Builds the 401 response for a deny, or `None` for [`Decision::Allow`].
pub fn deny_response(decision: Decision) -> Option<Response> {
    decision
        .rejection()
        .map(|doc| (StatusCode::UNAUTHORIZED, Json(doc)).into_response())
}

/// Logs `err` and builds the generic 500 response.
pub fn error_response(err: &AuthzError, request_id: Option<&str>) -> Response {
    tracing::error!(error = %err, request_id = ?request_id, "authorization check failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorDocument::internal()),
    )
        .into_response()
}
