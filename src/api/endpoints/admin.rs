//! Administrator endpoints. Every route here sits behind the role gate.
//!
//! - `GET /api/admin/stats`
//! - `GET /api/admin/donors`: search with `blood_group`, `location`, `limit`, `offset`
//! - `GET /api/admin/donors/:id`
//! - `GET|POST /api/admin/urgent-requests`
//! - `POST /api/admin/urgent-requests/:id/fulfill`

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::json_body;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::donors::{self, DonorPage, DonorStats, SearchQuery};
use crate::models::enums::RequestStatus;
use crate::models::{Donor, UrgentRequest};
use crate::session::Identity;
use crate::urgent::{self, BroadcastOutcome, NewUrgentRequest};

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

pub async fn stats(State(ctx): State<ApiContext>) -> Result<Json<DonorStats>, ApiError> {
    let conn = ctx.core.db()?;
    Ok(Json(donors::stats(&conn)?))
}

pub async fn search_donors(
    State(ctx): State<ApiContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<DonorPage>, ApiError> {
    let conn = ctx.core.db()?;
    Ok(Json(donors::search(&conn, &query)?))
}

pub async fn donor_detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Donor>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.db()?;
    Ok(Json(donors::get_donor(&conn, &id)?))
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<UrgentRequest>,
    pub total: usize,
}

pub async fn list_requests(
    State(ctx): State<ApiContext>,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(
            RequestStatus::from_str(s)
                .map_err(|_| ApiError::BadRequest(format!("Unknown status {s:?}")))?,
        ),
    };

    let conn = ctx.core.db()?;
    let requests = urgent::list_requests(&conn, status)?;
    Ok(Json(RequestListResponse {
        total: requests.len(),
        requests,
    }))
}

pub async fn create_request(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<NewUrgentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BroadcastOutcome>), ApiError> {
    let input = json_body(payload)?;
    let notifier = ctx.core.notifier();
    let conn = ctx.core.db()?;
    let outcome = urgent::create_urgent_request(&conn, notifier.as_ref(), identity.account_id, input)?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn fulfill_request(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<UrgentRequest>, ApiError> {
    let id = parse_id(&id)?;
    let conn = ctx.core.db()?;
    Ok(Json(urgent::fulfill_request(&conn, &id)?))
}
