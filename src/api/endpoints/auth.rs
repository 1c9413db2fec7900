//! Account endpoints.
//!
//! `POST /api/auth/signup`, `POST /api/auth/signin`: unprotected, rate-limited
//! `POST /api/auth/signout`, `GET /api/auth/session`: session required

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::accounts::{self, SignInForm, SignInOutcome, SignUpForm};
use crate::api::endpoints::json_body;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SessionToken};
use crate::authorization;
use crate::db;
use crate::session::Identity;

#[derive(Serialize)]
pub struct SignUpResponse {
    pub account_id: Uuid,
    pub email: String,
    pub message: &'static str,
}

/// `POST /api/auth/signup`: create an account. No session is started.
///
/// Password hashing runs on the blocking pool, outside the store lock.
pub async fn sign_up(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SignUpForm>, JsonRejection>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let form = json_body(payload)?;
    let core = ctx.core.clone();

    let account = tokio::task::spawn_blocking(move || accounts::sign_up(&core, form))
        .await
        .map_err(|e| ApiError::Internal(format!("sign-up task: {e}")))??;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            account_id: account.id,
            email: account.email,
            message: "Account created. Please sign in.",
        }),
    ))
}

/// `POST /api/auth/signin`: verify credentials and issue a bearer token.
pub async fn sign_in(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SignInForm>, JsonRejection>,
) -> Result<Json<SignInOutcome>, ApiError> {
    let form = json_body(payload)?;
    let core = ctx.core.clone();

    let outcome = tokio::task::spawn_blocking(move || accounts::sign_in(&core, form))
        .await
        .map_err(|e| ApiError::Internal(format!("sign-in task: {e}")))??;

    Ok(Json(outcome))
}

#[derive(Serialize)]
pub struct SignOutResponse {
    pub signed_out: bool,
    pub redirect: crate::navigation::Route,
}

/// `POST /api/auth/signout`
pub async fn sign_out(
    State(ctx): State<ApiContext>,
    Extension(token): Extension<SessionToken>,
) -> Result<Json<SignOutResponse>, ApiError> {
    let signed_out = accounts::sign_out(&ctx.core, &token.0)?;
    Ok(Json(SignOutResponse {
        signed_out,
        redirect: crate::navigation::Route::Login,
    }))
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub identity: Identity,
    pub is_admin: bool,
    pub has_donor_profile: bool,
}

/// `GET /api/auth/session`: who am I.
pub async fn session(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (is_admin, has_donor_profile) = {
        let conn = ctx.core.db()?;
        (
            authorization::is_admin(&conn, &identity)?,
            db::get_donor_by_user(&conn, &identity.account_id)?.is_some(),
        )
    };

    Ok(Json(SessionResponse {
        identity,
        is_admin,
        has_donor_profile,
    }))
}
