//! `GET /api/compatibility/:blood_group`: public lookup.

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::compatibility::{describe, lookup_code};
use crate::models::enums::BloodGroup;

#[derive(Debug, Serialize)]
pub struct CompatibilityResponse {
    pub blood_group: String,
    pub known: bool,
    pub can_receive_from: Vec<BloodGroup>,
    pub can_donate_to: Vec<BloodGroup>,
    pub receive_summary: String,
    pub donate_summary: String,
}

/// Unknown codes answer 200 with empty lists rendered as "N/A".
pub async fn lookup(Path(code): Path<String>) -> Json<CompatibilityResponse> {
    let (receive, donate) = match lookup_code(&code) {
        Some(row) => (row.can_receive_from.to_vec(), row.can_donate_to.to_vec()),
        None => (Vec::new(), Vec::new()),
    };

    Json(CompatibilityResponse {
        known: !receive.is_empty(),
        receive_summary: describe(&receive),
        donate_summary: describe(&donate),
        blood_group: code,
        can_receive_from: receive,
        can_donate_to: donate,
    })
}
