//! Audit logging middleware.
//!
//! Wraps the whole router, so rejected and unmatched requests are logged
//! too. The account id comes from the `Identity` the session middleware
//! leaves on the response.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::session::Identity;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let account_id = response
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.account_id.to_string());
    tracing::info!(
        target: "lifelink_lib::audit",
        %method,
        path = %path,
        status = response.status().as_u16(),
        account_id = account_id.as_deref().unwrap_or("-"),
        "api access"
    );

    response
}
