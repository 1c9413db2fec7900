//! Donor self-service endpoints.
//!
//! - `POST /api/donors`: register the signed-in account as a donor
//! - `GET /api/donors/me`: own profile, or a redirect hint to registration
//! - `PATCH /api/donors/me`: partial profile edit

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::endpoints::json_body;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::donors::{self, DonorRegistration, ProfileEdit};
use crate::models::Donor;
use crate::navigation::Route;
use crate::session::Identity;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub donor: Option<Donor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Route>,
}

impl ProfileResponse {
    /// Absence of a profile is a normal branch, not an error.
    pub fn from_lookup(donor: Option<Donor>) -> Self {
        let redirect = donor.is_none().then_some(Route::RegisterDonor);
        Self { donor, redirect }
    }
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<DonorRegistration>, JsonRejection>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    let form = json_body(payload)?;
    let donor = {
        let conn = ctx.core.db()?;
        donors::register(&conn, &identity, form)?
    };

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            donor: Some(donor),
            redirect: Some(Route::Dashboard),
        }),
    ))
}

pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let conn = ctx.core.db()?;
    let donor = donors::load_profile(&conn, &identity)?;
    Ok(Json(ProfileResponse::from_lookup(donor)))
}

pub async fn update_me(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ProfileEdit>, JsonRejection>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let edit = json_body(payload)?;
    let conn = ctx.core.db()?;
    let donor = donors::update_profile(&conn, &identity, edit)?;
    Ok(Json(ProfileResponse {
        donor: Some(donor),
        redirect: None,
    }))
}
