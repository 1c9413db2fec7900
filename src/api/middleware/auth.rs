//! Bearer-token session middleware and the admin role gate.
//!
//! `require_session` resolves `Authorization: Bearer <token>` against the
//! session registry and injects the `Identity` (plus the raw
//! `SessionToken`) into request extensions, and tags the response with the
//! same `Identity` for the audit logger. `require_admin` runs after it and
//! consults the role table.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionToken};
use crate::authorization::{self, AccessReason};
use crate::session::Identity;

fn api_context(req: &Request<axum::body::Body>) -> Result<ApiContext, ApiError> {
    req.extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))
}

/// Extract the bearer token, if any.
pub fn bearer_token(req: &Request<axum::body::Body>) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Require a live session.
pub async fn require_session(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_session_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_session_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = api_context(&req)?;
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?;

    let identity = ctx
        .core
        .current_identity(&token)?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(identity.clone());
    req.extensions_mut().insert(SessionToken(token));

    let mut response = next.run(req).await;
    response.extensions_mut().insert(identity);
    Ok(response)
}

/// Admit only identities holding the admin role. Must run inside
/// `require_session`.
pub async fn require_admin(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_admin_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_admin_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = api_context(&req)?;
    let identity = req.extensions().get::<Identity>();

    // Connection guard is !Send, drop before .await
    let decision = {
        let conn = ctx.core.db()?;
        authorization::check_admin(&conn, identity)?
    };

    match decision.reason {
        AccessReason::AdminRole => Ok(next.run(req).await),
        AccessReason::Unauthenticated => Err(ApiError::Unauthorized),
        AccessReason::MissingRole => Err(ApiError::Forbidden(
            "Admin access required".into(),
        )),
    }
}
