use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BloodGroup, RequestStatus, UrgencyLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgentRequest {
    pub id: Uuid,
    pub blood_group: BloodGroup,
    pub units_needed: u32,
    pub hospital_name: String,
    pub city: String,
    pub state: String,
    pub contact_number: String,
    pub patient_name: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub additional_notes: Option<String>,
    pub status: RequestStatus,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub fulfilled_at: Option<NaiveDateTime>,
}
