//! API endpoint handlers.
//!
//! Each module corresponds to a screen of the client. Handlers lock the
//! store through `CoreState`, call into the domain modules and map
//! `ServiceError` to `ApiError`.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::api::error::ApiError;

pub mod admin;
pub mod auth;
pub mod compatibility;
pub mod dashboard;
pub mod donors;
pub mod health;

/// Unwrap a JSON body, answering malformed input with our error shape.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}
