//! Donor dashboard and achievements.
//!
//! Both recompute badges from the stored donor row on every call.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::achievements::{derive_badges, Badge};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::compatibility::{self, Compatibility};
use crate::donors;
use crate::models::Donor;
use crate::navigation::Route;
use crate::session::Identity;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub donor: Option<Donor>,
    pub compatibility: Option<Compatibility>,
    pub badges: Vec<Badge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Route>,
}

/// `GET /api/dashboard`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let donor = {
        let conn = ctx.core.db()?;
        donors::load_profile(&conn, &identity)?
    };

    let Some(donor) = donor else {
        return Ok(Json(DashboardResponse {
            donor: None,
            compatibility: None,
            badges: Vec::new(),
            redirect: Some(Route::RegisterDonor),
        }));
    };

    Ok(Json(DashboardResponse {
        compatibility: Some(compatibility::lookup(donor.blood_group)),
        badges: derive_badges(&donor),
        donor: Some(donor),
        redirect: None,
    }))
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub full_name: Option<String>,
    pub badges: Vec<Badge>,
    pub total_badges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Route>,
}

/// `GET /api/achievements`
pub async fn achievements(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<AchievementsResponse>, ApiError> {
    let donor = {
        let conn = ctx.core.db()?;
        donors::load_profile(&conn, &identity)?
    };

    Ok(Json(match donor {
        Some(donor) => {
            let badges = derive_badges(&donor);
            AchievementsResponse {
                full_name: Some(donor.full_name),
                total_badges: badges.len(),
                badges,
                redirect: None,
            }
        }
        None => AchievementsResponse {
            full_name: None,
            badges: Vec::new(),
            total_badges: 0,
            redirect: Some(Route::RegisterDonor),
        },
    }))
}
