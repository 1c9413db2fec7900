//! HTTP API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! 1. Audit logger → 2. Rate limiter (sign-up / sign-in) → 3. Session → 4. Admin gate

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method, Uri};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;
use crate::navigation::Route;

/// Build the API router around shared state with default settings.
pub fn api_router(core: Arc<CoreState>) -> Router {
    api_router_with_context(ApiContext::new(core))
}

/// Build the API router around a prepared context.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn api_router_with_context(ctx: ApiContext) -> Router {
    // Layers are applied from bottom (innermost) to top (outermost).
    // Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/compatibility/:blood_group",
            get(endpoints::compatibility::lookup),
        )
        .with_state(ctx.clone());

    let credentials = Router::new()
        .route("/auth/signup", post(endpoints::auth::sign_up))
        .route("/auth/signin", post(endpoints::auth::sign_in))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::rate::limit))
        .layer(axum::Extension(ctx.clone()));

    let signed_in = Router::new()
        .route("/auth/signout", post(endpoints::auth::sign_out))
        .route("/auth/session", get(endpoints::auth::session))
        .route("/donors", post(endpoints::donors::register))
        .route(
            "/donors/me",
            get(endpoints::donors::me).patch(endpoints::donors::update_me),
        )
        .route("/dashboard", get(endpoints::dashboard::dashboard))
        .route("/achievements", get(endpoints::dashboard::achievements))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_session))
        .layer(axum::Extension(ctx.clone()));

    let admin = Router::new()
        .route("/admin/stats", get(endpoints::admin::stats))
        .route("/admin/donors", get(endpoints::admin::search_donors))
        .route("/admin/donors/:id", get(endpoints::admin::donor_detail))
        .route(
            "/admin/urgent-requests",
            get(endpoints::admin::list_requests).post(endpoints::admin::create_request),
        )
        .route(
            "/admin/urgent-requests/:id/fulfill",
            post(endpoints::admin::fulfill_request),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn(middleware::auth::require_session))
        .layer(axum::Extension(ctx));

    let api = Router::new()
        .merge(public)
        .merge(credentials)
        .merge(signed_in)
        .merge(admin)
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors_layer())
}

/// Browser clients send bearer tokens, never cookies.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NoRoute {
        path: uri.path().to_string(),
        hint: Route::from_path(uri.path()),
    }
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
