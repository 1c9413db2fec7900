//! Donor registration, profile access, admin search and statistics.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use crate::db::{self, repository::now_timestamp};
use crate::error::ServiceError;
use crate::models::enums::{BloodGroup, Gender};
use crate::models::{Donor, DonorFilter, DonorUpdate};
use crate::session::Identity;
use crate::validation::{non_blank, parse_iso_date, validate_email, RequiredFields, ValidationError};

pub const MIN_DONOR_AGE: u8 = 18;
pub const MAX_DONOR_AGE: u8 = 65;

/// Registration form as submitted by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DonorRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub blood_group: String,
    pub age: Option<i64>,
    pub gender: String,
    pub date_of_birth: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub medical_conditions: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
}

fn parse_age(value: i64) -> Result<u8, ValidationError> {
    u8::try_from(value)
        .ok()
        .filter(|age| (MIN_DONOR_AGE..=MAX_DONOR_AGE).contains(age))
        .ok_or_else(|| ValidationError::Invalid {
            field: "age",
            reason: format!("donors must be between {MIN_DONOR_AGE} and {MAX_DONOR_AGE}"),
        })
}

fn parse_blood_group(value: &str) -> Result<BloodGroup, ValidationError> {
    BloodGroup::from_str(value.trim()).map_err(|_| ValidationError::Invalid {
        field: "blood_group",
        reason: format!("unknown blood group {value:?}"),
    })
}

fn parse_gender(value: &str) -> Result<Gender, ValidationError> {
    Gender::from_str(&value.trim().to_lowercase()).map_err(|_| ValidationError::Invalid {
        field: "gender",
        reason: "expected male, female or other".into(),
    })
}

fn required_text(field: &'static str, value: String) -> Result<String, ValidationError> {
    non_blank(Some(value)).ok_or(ValidationError::MissingFields(vec![field]))
}

/// Validate a registration form into a donor row for `user_id`.
pub fn validate_registration(
    user_id: Uuid,
    form: DonorRegistration,
) -> Result<Donor, ValidationError> {
    let age_text = form.age.map(|a| a.to_string()).unwrap_or_default();
    RequiredFields::new()
        .check("full_name", &form.full_name)
        .check("email", &form.email)
        .check("phone", &form.phone)
        .check("blood_group", &form.blood_group)
        .check("age", &age_text)
        .check("gender", &form.gender)
        .check("date_of_birth", &form.date_of_birth)
        .check("address", &form.address)
        .check("city", &form.city)
        .check("state", &form.state)
        .check("pincode", &form.pincode)
        .finish()?;

    validate_email(&form.email)?;
    let blood_group = parse_blood_group(&form.blood_group)?;
    let age = parse_age(form.age.unwrap_or_default())?;
    let gender = parse_gender(&form.gender)?;
    let date_of_birth = parse_iso_date("date_of_birth", &form.date_of_birth)?;

    let now = now_timestamp();
    Ok(Donor {
        id: Uuid::new_v4(),
        user_id,
        full_name: required_text("full_name", form.full_name)?,
        email: form.email.trim().to_string(),
        phone: required_text("phone", form.phone)?,
        blood_group,
        age,
        gender,
        date_of_birth,
        address: required_text("address", form.address)?,
        city: required_text("city", form.city)?,
        state: required_text("state", form.state)?,
        pincode: required_text("pincode", form.pincode)?,
        available_to_donate: true,
        last_donation_date: None,
        medical_conditions: non_blank(form.medical_conditions),
        emergency_contact_name: non_blank(form.emergency_contact_name),
        emergency_contact_phone: non_blank(form.emergency_contact_phone),
        created_at: now,
        updated_at: now,
    })
}

/// Register the signed-in account as a donor.
pub fn register(
    conn: &Connection,
    identity: &Identity,
    form: DonorRegistration,
) -> Result<Donor, ServiceError> {
    if db::get_donor_by_user(conn, &identity.account_id)?.is_some() {
        return Err(ServiceError::Conflict(
            "A donor profile already exists for this account".into(),
        ));
    }

    let donor = validate_registration(identity.account_id, form)?;
    db::insert_donor(conn, &donor).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::Conflict("A donor profile already exists for this account".into())
        } else {
            e.into()
        }
    })?;

    tracing::info!(donor_id = %donor.id, blood_group = %donor.blood_group, "Donor registered");
    Ok(donor)
}

/// The donor row of the signed-in account, if it has registered.
pub fn load_profile(conn: &Connection, identity: &Identity) -> Result<Option<Donor>, ServiceError> {
    Ok(db::get_donor_by_user(conn, &identity.account_id)?)
}

/// Profile edit payload. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileEdit {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub available_to_donate: Option<bool>,
    pub last_donation_date: Option<String>,
}

fn edited_text(field: &'static str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    match value {
        None => Ok(None),
        Some(v) => required_text(field, v).map(Some),
    }
}

pub fn validate_edit(edit: ProfileEdit, today: NaiveDate) -> Result<DonorUpdate, ValidationError> {
    let last_donation_date = match edit.last_donation_date.as_deref() {
        Some(raw) => {
            let date = parse_iso_date("last_donation_date", raw)?;
            if date > today {
                return Err(ValidationError::Invalid {
                    field: "last_donation_date",
                    reason: "cannot be in the future".into(),
                });
            }
            Some(date)
        }
        None => None,
    };

    Ok(DonorUpdate {
        full_name: edited_text("full_name", edit.full_name)?,
        phone: edited_text("phone", edit.phone)?,
        age: edit.age.map(parse_age).transpose()?,
        gender: edit.gender.as_deref().map(parse_gender).transpose()?,
        city: edited_text("city", edit.city)?,
        state: edited_text("state", edit.state)?,
        available_to_donate: edit.available_to_donate,
        last_donation_date,
    })
}

/// Apply a profile edit and return the refreshed row.
pub fn update_profile(
    conn: &Connection,
    identity: &Identity,
    edit: ProfileEdit,
) -> Result<Donor, ServiceError> {
    let update = validate_edit(edit, now_timestamp().date())?;
    if !update.is_empty() {
        match db::update_donor(conn, &identity.account_id, &update) {
            Ok(()) => {}
            Err(db::DatabaseError::NotFound { .. }) => {
                return Err(ServiceError::NotFound("Donor profile not found".into()))
            }
            Err(e) => return Err(e.into()),
        }
    }
    db::get_donor_by_user(conn, &identity.account_id)?
        .ok_or_else(|| ServiceError::NotFound("Donor profile not found".into()))
}

// ─── Admin search ──────────────────────────────────────────

/// Query string of the admin donor search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub blood_group: Option<String>,
    pub location: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SearchQuery {
    /// `all` and blank mean no blood-group filter.
    pub fn to_filter(&self) -> Result<DonorFilter, ValidationError> {
        let blood_group = match self.blood_group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(g) if g.eq_ignore_ascii_case("all") => None,
            Some(g) => Some(parse_blood_group(g)?),
        };
        Ok(DonorFilter {
            blood_group,
            location: non_blank(self.location.clone()),
            limit: self
                .limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DonorPage {
    pub donors: Vec<Donor>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

pub fn search(conn: &Connection, query: &SearchQuery) -> Result<DonorPage, ServiceError> {
    let filter = query.to_filter()?;
    let (donors, total) = db::search_donors(conn, &filter)?;
    tracing::debug!(returned = donors.len(), total, "Donor search");
    Ok(DonorPage {
        donors,
        total,
        limit: filter.limit,
        offset: filter.offset,
    })
}

pub fn get_donor(conn: &Connection, id: &Uuid) -> Result<Donor, ServiceError> {
    db::get_donor(conn, id)?.ok_or_else(|| ServiceError::NotFound("Donor not found".into()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DonorStats {
    pub total_donors: u64,
    pub active_donors: u64,
}

pub fn stats(conn: &Connection) -> Result<DonorStats, ServiceError> {
    let (total_donors, active_donors) = db::count_donors(conn)?;
    Ok(DonorStats {
        total_donors,
        active_donors,
    })
}
