use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_datetime, now_timestamp, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{BloodGroup, RequestStatus, UrgencyLevel};
use crate::models::{UrgentRequest, UrgentRequestFilter};

const REQUEST_COLUMNS: &str = "id, blood_group, units_needed, hospital_name, city, state,
     contact_number, patient_name, urgency_level, additional_notes, status, created_by,
     created_at, updated_at, fulfilled_at";

pub fn insert_urgent_request(conn: &Connection, req: &UrgentRequest) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO urgent_blood_requests ({REQUEST_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            req.id.to_string(),
            req.blood_group.as_str(),
            req.units_needed,
            req.hospital_name,
            req.city,
            req.state,
            req.contact_number,
            req.patient_name,
            req.urgency_level.as_str(),
            req.additional_notes,
            req.status.as_str(),
            req.created_by.map(|id| id.to_string()),
            format_datetime(&req.created_at),
            format_datetime(&req.updated_at),
            req.fulfilled_at.as_ref().map(format_datetime),
        ],
    )?;
    Ok(())
}

pub fn get_urgent_request(conn: &Connection, id: &Uuid) -> Result<Option<UrgentRequest>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM urgent_blood_requests WHERE id = ?1"),
            params![id.to_string()],
            |row| Ok(request_row_from_rusqlite(row)),
        )
        .optional()?;
    row.map(|r| request_from_row(r?)).transpose()
}

/// Newest first.
pub fn list_urgent_requests(
    conn: &Connection,
    filter: &UrgentRequestFilter,
) -> Result<Vec<UrgentRequest>, DatabaseError> {
    let mut sql = format!("SELECT {REQUEST_COLUMNS} FROM urgent_blood_requests");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(status) = filter.status {
        sql.push_str(" WHERE status = ?1");
        params_vec.push(Box::new(status.as_str()));
    }
    sql.push_str(" ORDER BY created_at DESC, id");

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(request_row_from_rusqlite(row)))?;

    let mut requests = Vec::new();
    for row in rows {
        requests.push(request_from_row(row??)?);
    }
    Ok(requests)
}

/// Transition an active request to fulfilled.
///
/// `NotFound` for an unknown id, `InvalidTransition` if it is already fulfilled.
pub fn mark_request_fulfilled(conn: &Connection, id: &Uuid) -> Result<UrgentRequest, DatabaseError> {
    let now = format_datetime(&now_timestamp());
    let changed = conn.execute(
        "UPDATE urgent_blood_requests
         SET status = 'fulfilled', fulfilled_at = ?1, updated_at = ?1
         WHERE id = ?2 AND status = 'active'",
        params![now, id.to_string()],
    )?;

    let current = get_urgent_request(conn, id)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "urgent_request".into(),
        id: id.to_string(),
    })?;
    if changed == 0 {
        return Err(DatabaseError::InvalidTransition(format!(
            "urgent request {id} is already {}",
            current.status
        )));
    }
    Ok(current)
}

// ─── Row mapping ───────────────────────────────────────────

type RequestRow = (
    String, String, i64, String, String, String, String, Option<String>, String,
    Option<String>, String, Option<String>, String, String, Option<String>,
);

fn request_row_from_rusqlite(row: &Row<'_>) -> Result<RequestRow, rusqlite::Error> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn request_from_row(row: RequestRow) -> Result<UrgentRequest, DatabaseError> {
    let (
        id, blood_group, units_needed, hospital_name, city, state, contact_number, patient_name,
        urgency_level, additional_notes, status, created_by, created_at, updated_at, fulfilled_at,
    ) = row;

    Ok(UrgentRequest {
        id: parse_uuid(&id)?,
        blood_group: BloodGroup::from_str(&blood_group)?,
        units_needed: u32::try_from(units_needed).map_err(|_| {
            DatabaseError::ConstraintViolation(format!("units_needed out of range: {units_needed}"))
        })?,
        hospital_name,
        city,
        state,
        contact_number,
        patient_name,
        urgency_level: UrgencyLevel::from_str(&urgency_level)?,
        additional_notes,
        status: RequestStatus::from_str(&status)?,
        created_by: created_by.as_deref().map(parse_uuid).transpose()?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        fulfilled_at: fulfilled_at.as_deref().map(parse_datetime).transpose()?,
    })
}
