use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BloodGroup, Gender};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: BloodGroup,
    pub age: u8,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub available_to_donate: bool,
    pub last_donation_date: Option<NaiveDate>,
    pub medical_conditions: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fields a donor may change from the profile screen.
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<Gender>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub available_to_donate: Option<bool>,
    pub last_donation_date: Option<NaiveDate>,
}

impl DonorUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.available_to_donate.is_none()
            && self.last_donation_date.is_none()
    }
}

/// Contact subset handed to the notifier for urgent-request matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorContact {
    pub full_name: String,
    pub email: String,
    pub phone: String,
}
