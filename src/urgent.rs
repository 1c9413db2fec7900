//! Urgent blood requests: creation, advisory donor broadcast, fulfilment.

use std::str::FromStr;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, repository::now_timestamp, DatabaseError};
use crate::error::ServiceError;
use crate::models::enums::{BloodGroup, RequestStatus, UrgencyLevel};
use crate::models::{DonorContact, MatchFilter, UrgentRequest, UrgentRequestFilter};
use crate::validation::{non_blank, RequiredFields, ValidationError};

/// Receives the donors matched by a new urgent request.
///
/// Delivery (email, SMS, push) is not part of this service; the shipped
/// implementation only records the broadcast in the log.
pub trait DonorNotifier: Send + Sync {
    fn notify(&self, request: &UrgentRequest, donors: &[DonorContact]);
}

/// Logs the broadcast without contacting anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl DonorNotifier for LogNotifier {
    fn notify(&self, request: &UrgentRequest, donors: &[DonorContact]) {
        tracing::info!(
            request_id = %request.id,
            blood_group = %request.blood_group,
            city = %request.city,
            matched = donors.len(),
            "Urgent request broadcast recorded (no delivery channel configured)"
        );
    }
}

/// Admin form payload for a new urgent request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUrgentRequest {
    #[serde(default)]
    pub blood_group: String,
    pub units_needed: Option<u32>,
    #[serde(default)]
    pub hospital_name: String,
    #[serde(default)]
    pub city: String,
    pub state: Option<String>,
    #[serde(default)]
    pub contact_number: String,
    pub patient_name: Option<String>,
    pub urgency_level: Option<UrgencyLevel>,
    pub additional_notes: Option<String>,
}

/// Result of a successful creation.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastOutcome {
    pub request: UrgentRequest,
    pub notified_count: usize,
    pub message: String,
}

/// Check the form and build the row to insert. No store access.
pub fn validate_request(
    input: NewUrgentRequest,
    created_by: Uuid,
) -> Result<UrgentRequest, ValidationError> {
    RequiredFields::new()
        .check("blood_group", &input.blood_group)
        .check("hospital_name", &input.hospital_name)
        .check("city", &input.city)
        .check("contact_number", &input.contact_number)
        .finish()?;

    let blood_group = BloodGroup::from_str(input.blood_group.trim()).map_err(|_| {
        ValidationError::Invalid {
            field: "blood_group",
            reason: format!("unknown blood group {:?}", input.blood_group),
        }
    })?;

    let units_needed = input.units_needed.unwrap_or(1);
    if units_needed == 0 {
        return Err(ValidationError::Invalid {
            field: "units_needed",
            reason: "at least one unit is required".into(),
        });
    }

    let now = now_timestamp();
    Ok(UrgentRequest {
        id: Uuid::new_v4(),
        blood_group,
        units_needed,
        hospital_name: input.hospital_name.trim().to_string(),
        city: input.city.trim().to_string(),
        state: non_blank(input.state).unwrap_or_default(),
        contact_number: input.contact_number.trim().to_string(),
        patient_name: non_blank(input.patient_name),
        urgency_level: input.urgency_level.unwrap_or_default(),
        additional_notes: non_blank(input.additional_notes),
        status: RequestStatus::Active,
        created_by: Some(created_by),
        created_at: now,
        updated_at: now,
        fulfilled_at: None,
    })
}

/// Validate, insert, then count and hand off matching available donors.
///
/// The insert and the match read are separate statements; the count is
/// advisory only.
pub fn create_urgent_request(
    conn: &Connection,
    notifier: &dyn DonorNotifier,
    created_by: Uuid,
    input: NewUrgentRequest,
) -> Result<BroadcastOutcome, ServiceError> {
    let request = validate_request(input, created_by)?;
    db::insert_urgent_request(conn, &request)?;

    let matches = db::find_matching_donor_contacts(
        conn,
        &MatchFilter {
            blood_group: request.blood_group,
            city: request.city.clone(),
            available_only: true,
        },
    )?;

    notifier.notify(&request, &matches);

    let notified_count = matches.len();
    let message = format!(
        "Notified {notified_count} matching donors in {}",
        request.city
    );
    tracing::info!(request_id = %request.id, notified_count, "Urgent request created");

    Ok(BroadcastOutcome {
        request,
        notified_count,
        message,
    })
}

pub fn list_requests(
    conn: &Connection,
    status: Option<RequestStatus>,
) -> Result<Vec<UrgentRequest>, ServiceError> {
    Ok(db::list_urgent_requests(conn, &UrgentRequestFilter { status })?)
}

/// Mark an active request fulfilled.
pub fn fulfill_request(conn: &Connection, id: &Uuid) -> Result<UrgentRequest, ServiceError> {
    match db::mark_request_fulfilled(conn, id) {
        Ok(request) => {
            tracing::info!(request_id = %id, "Urgent request fulfilled");
            Ok(request)
        }
        Err(DatabaseError::NotFound { .. }) => {
            Err(ServiceError::NotFound("Urgent request not found".into()))
        }
        Err(DatabaseError::InvalidTransition(reason)) => Err(ServiceError::Conflict(reason)),
        Err(e) => Err(e.into()),
    }
}
