use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{escape_like, format_datetime, now_timestamp, parse_date, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::{BloodGroup, Gender};
use crate::models::{Donor, DonorContact, DonorFilter, DonorUpdate, MatchFilter};

const DONOR_COLUMNS: &str = "id, user_id, full_name, email, phone, blood_group, age, gender,
     date_of_birth, address, city, state, pincode, available_to_donate, last_donation_date,
     medical_conditions, emergency_contact_name, emergency_contact_phone, created_at, updated_at";

pub fn insert_donor(conn: &Connection, donor: &Donor) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO donors ({DONOR_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        ),
        params![
            donor.id.to_string(),
            donor.user_id.to_string(),
            donor.full_name,
            donor.email,
            donor.phone,
            donor.blood_group.as_str(),
            donor.age,
            donor.gender.as_str(),
            donor.date_of_birth.to_string(),
            donor.address,
            donor.city,
            donor.state,
            donor.pincode,
            donor.available_to_donate as i32,
            donor.last_donation_date.map(|d| d.to_string()),
            donor.medical_conditions,
            donor.emergency_contact_name,
            donor.emergency_contact_phone,
            format_datetime(&donor.created_at),
            format_datetime(&donor.updated_at),
        ],
    )?;
    Ok(())
}

/// "Maybe single" read: the donor profile owned by an account, if any.
pub fn get_donor_by_user(conn: &Connection, user_id: &Uuid) -> Result<Option<Donor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DONOR_COLUMNS} FROM donors WHERE user_id = ?1"),
            params![user_id.to_string()],
            |row| Ok(donor_row_from_rusqlite(row)),
        )
        .optional()?;
    row.map(|r| donor_from_row(r?)).transpose()
}

pub fn get_donor(conn: &Connection, id: &Uuid) -> Result<Option<Donor>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {DONOR_COLUMNS} FROM donors WHERE id = ?1"),
            params![id.to_string()],
            |row| Ok(donor_row_from_rusqlite(row)),
        )
        .optional()?;
    row.map(|r| donor_from_row(r?)).transpose()
}

/// Apply a partial profile update. Returns `NotFound` when the account has no donor row.
pub fn update_donor(
    conn: &Connection,
    user_id: &Uuid,
    update: &DonorUpdate,
) -> Result<(), DatabaseError> {
    let mut sql = String::from("UPDATE donors SET updated_at = ?1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> =
        vec![Box::new(format_datetime(&now_timestamp()))];
    let mut param_idx = 2;

    let mut set = |column: &str, value: Box<dyn rusqlite::types::ToSql>| {
        sql.push_str(&format!(", {column} = ?{param_idx}"));
        params_vec.push(value);
        param_idx += 1;
    };

    if let Some(v) = &update.full_name {
        set("full_name", Box::new(v.clone()));
    }
    if let Some(v) = &update.phone {
        set("phone", Box::new(v.clone()));
    }
    if let Some(v) = update.age {
        set("age", Box::new(v));
    }
    if let Some(v) = update.gender {
        set("gender", Box::new(v.as_str()));
    }
    if let Some(v) = &update.city {
        set("city", Box::new(v.clone()));
    }
    if let Some(v) = &update.state {
        set("state", Box::new(v.clone()));
    }
    if let Some(v) = update.available_to_donate {
        set("available_to_donate", Box::new(v as i32));
    }
    if let Some(v) = update.last_donation_date {
        set("last_donation_date", Box::new(v.to_string()));
    }

    sql.push_str(&format!(" WHERE user_id = ?{param_idx}"));
    params_vec.push(Box::new(user_id.to_string()));

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let changed = conn.execute(&sql, params_refs.as_slice())?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "donor".into(),
            id: user_id.to_string(),
        });
    }
    Ok(())
}

/// Run a donor search. Returns the requested page and the total match count.
///
/// Blood group is an equality filter; location matches city OR state
/// case-insensitively as a literal substring.
pub fn search_donors(
    conn: &Connection,
    filter: &DonorFilter,
) -> Result<(Vec<Donor>, u64), DatabaseError> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut param_idx = 1;

    if let Some(group) = filter.blood_group {
        where_sql.push_str(&format!(" AND blood_group = ?{param_idx}"));
        params_vec.push(Box::new(group.as_str()));
        param_idx += 1;
    }

    if let Some(location) = &filter.location {
        let trimmed = location.trim();
        if !trimmed.is_empty() {
            let pattern = format!("%{}%", escape_like(&trimmed.to_lowercase()));
            where_sql.push_str(&format!(
                " AND (fold_case(city) LIKE ?{p} ESCAPE '\\' OR fold_case(state) LIKE ?{p} ESCAPE '\\')",
                p = param_idx
            ));
            params_vec.push(Box::new(pattern));
            param_idx += 1;
        }
    }

    let limit = i64::from(filter.limit);
    let offset = i64::from(filter.offset);
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM donors{where_sql}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {DONOR_COLUMNS} FROM donors{where_sql}
         ORDER BY full_name COLLATE NOCASE, id
         LIMIT ?{} OFFSET ?{}",
        param_idx,
        param_idx + 1
    );
    let mut page_params = params_refs;
    page_params.push(&limit);
    page_params.push(&offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(page_params.as_slice(), |row| Ok(donor_row_from_rusqlite(row)))?;

    let mut donors = Vec::new();
    for row in rows {
        donors.push(donor_from_row(row??)?);
    }
    Ok((donors, total.max(0) as u64))
}

/// Contacts of donors matching an urgent request (exact blood group and city).
pub fn find_matching_donor_contacts(
    conn: &Connection,
    filter: &MatchFilter,
) -> Result<Vec<DonorContact>, DatabaseError> {
    let mut sql = String::from(
        "SELECT full_name, email, phone FROM donors
         WHERE blood_group = ?1 AND city = ?2",
    );
    if filter.available_only {
        sql.push_str(" AND available_to_donate = 1");
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![filter.blood_group.as_str(), filter.city],
        |row| {
            Ok(DonorContact {
                full_name: row.get(0)?,
                email: row.get(1)?,
                phone: row.get(2)?,
            })
        },
    )?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// (total donors, donors available to donate)
pub fn count_donors(conn: &Connection) -> Result<(u64, u64), DatabaseError> {
    let (total, active): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN available_to_donate = 1 THEN 1 ELSE 0 END), 0)
         FROM donors",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok((total.max(0) as u64, active.max(0) as u64))
}

// ─── Row mapping ───────────────────────────────────────────

type DonorRow = (
    String, String, String, String, String, String, i64, String, String, String,
    String, String, String, i32, Option<String>, Option<String>, Option<String>,
    Option<String>, String, String,
);

fn donor_row_from_rusqlite(row: &Row<'_>) -> Result<DonorRow, rusqlite::Error> {
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
        row.get(15)?,
        row.get(16)?,
        row.get(17)?,
        row.get(18)?,
        row.get(19)?,
    ))
}

fn donor_from_row(row: DonorRow) -> Result<Donor, DatabaseError> {
    let (
        id, user_id, full_name, email, phone, blood_group, age, gender, date_of_birth, address,
        city, state, pincode, available, last_donation_date, medical_conditions,
        emergency_contact_name, emergency_contact_phone, created_at, updated_at,
    ) = row;

    Ok(Donor {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        full_name,
        email,
        phone,
        blood_group: BloodGroup::from_str(&blood_group)?,
        age: u8::try_from(age)
            .map_err(|_| DatabaseError::ConstraintViolation(format!("donor age out of range: {age}")))?,
        gender: Gender::from_str(&gender)?,
        date_of_birth: parse_date(&date_of_birth)?,
        address,
        city,
        state,
        pincode,
        available_to_donate: available != 0,
        last_donation_date: last_donation_date.as_deref().map(parse_date).transpose()?,
        medical_conditions,
        emergency_contact_name,
        emergency_contact_phone,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::repository::test_support::{make_account, sample_donor, seed_donor};
    use crate::db::sqlite::open_memory_database;

    fn page(filter: DonorFilter) -> DonorFilter {
        DonorFilter { limit: 100, ..filter }
    }

    #[test]
    fn donor_insert_and_read_back_by_user() {
        let conn = open_memory_database().unwrap();
        let donor = seed_donor(&conn, "Meera Nair", BloodGroup::ONegative, "Kochi", "Kerala");

        let read = get_donor_by_user(&conn, &donor.user_id).unwrap().unwrap();
        assert_eq!(read, donor);
        let by_id = get_donor(&conn, &donor.id).unwrap().unwrap();
        assert_eq!(by_id, donor);
    }

    #[test]
    fn one_donor_row_per_account() {
        let conn = open_memory_database().unwrap();
        let user = make_account(&conn, "twice@example.com");
        insert_donor(&conn, &sample_donor(user, "First", BloodGroup::APositive, "Pune", "Maharashtra"))
            .unwrap();
        let err = insert_donor(
            &conn,
            &sample_donor(user, "Second", BloodGroup::APositive, "Pune", "Maharashtra"),
        )
        .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn missing_donor_is_none() {
        let conn = open_memory_database().unwrap();
        let user = make_account(&conn, "fresh@example.com");
        assert!(get_donor_by_user(&conn, &user).unwrap().is_none());
    }

    #[test]
    fn search_without_filters_returns_all_rows() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Anil", BloodGroup::APositive, "Pune", "Maharashtra");
        seed_donor(&conn, "Bina", BloodGroup::BNegative, "Chennai", "Tamil Nadu");
        seed_donor(&conn, "Chetan", BloodGroup::OPositive, "Mumbai", "Maharashtra");

        let (donors, total) = search_donors(&conn, &page(DonorFilter::default())).unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = donors.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(names, vec!["Anil", "Bina", "Chetan"]);
    }

    #[test]
    fn search_by_blood_group_is_exact() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Anil", BloodGroup::APositive, "Pune", "Maharashtra");
        seed_donor(&conn, "Bina", BloodGroup::ANegative, "Pune", "Maharashtra");
        seed_donor(&conn, "Chetan", BloodGroup::AbPositive, "Pune", "Maharashtra");

        let filter = page(DonorFilter {
            blood_group: Some(BloodGroup::APositive),
            ..Default::default()
        });
        let (donors, total) = search_donors(&conn, &filter).unwrap();
        assert_eq!(total, 1);
        assert!(donors.iter().all(|d| d.blood_group == BloodGroup::APositive));
    }

    #[test]
    fn search_by_location_matches_city_or_state_ignoring_case() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Anil", BloodGroup::APositive, "Pune", "Maharashtra");
        seed_donor(&conn, "Bina", BloodGroup::APositive, "Nagpur", "MAHARASHTRA");
        seed_donor(&conn, "Chetan", BloodGroup::APositive, "Chennai", "Tamil Nadu");
        seed_donor(&conn, "Devi", BloodGroup::APositive, "Punem", "Goa");

        let filter = page(DonorFilter {
            location: Some("maha".into()),
            ..Default::default()
        });
        let (donors, _) = search_donors(&conn, &filter).unwrap();
        assert_eq!(donors.len(), 2);
        for d in &donors {
            let hit = d.city.to_lowercase().contains("maha") || d.state.to_lowercase().contains("maha");
            assert!(hit, "{} did not match", d.full_name);
        }

        let filter = page(DonorFilter {
            location: Some("PUNE".into()),
            ..Default::default()
        });
        let (donors, _) = search_donors(&conn, &filter).unwrap();
        let names: Vec<_> = donors.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(names, vec!["Anil", "Devi"]);
    }

    #[test]
    fn search_by_location_folds_non_ascii_case() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Inês", BloodGroup::APositive, "Évora", "Alentejo");
        seed_donor(&conn, "Jörg", BloodGroup::APositive, "Köln", "NORDRHEIN-WESTFALEN");

        for query in ["ÉVORA", "évora", "Évora", "vor"] {
            let filter = page(DonorFilter {
                location: Some(query.into()),
                ..Default::default()
            });
            let (donors, total) = search_donors(&conn, &filter).unwrap();
            assert_eq!(total, 1, "query {query}");
            assert_eq!(donors[0].city, "Évora");
        }

        let filter = page(DonorFilter {
            location: Some("KÖLN".into()),
            ..Default::default()
        });
        let (donors, _) = search_donors(&conn, &filter).unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].full_name, "Jörg");
    }

    #[test]
    fn search_location_wildcards_are_literal() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Anil", BloodGroup::APositive, "Pune", "Maharashtra");

        let filter = page(DonorFilter {
            location: Some("%".into()),
            ..Default::default()
        });
        let (donors, total) = search_donors(&conn, &filter).unwrap();
        assert!(donors.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn search_combines_filters_and_pages() {
        let conn = open_memory_database().unwrap();
        for name in ["Asha", "Bala", "Chitra", "Dev"] {
            seed_donor(&conn, name, BloodGroup::OPositive, "Delhi", "Delhi");
        }
        seed_donor(&conn, "Esha", BloodGroup::ONegative, "Delhi", "Delhi");

        let filter = DonorFilter {
            blood_group: Some(BloodGroup::OPositive),
            location: Some("del".into()),
            limit: 2,
            offset: 2,
        };
        let (donors, total) = search_donors(&conn, &filter).unwrap();
        assert_eq!(total, 4);
        let names: Vec<_> = donors.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(names, vec!["Chitra", "Dev"]);
    }

    #[test]
    fn update_changes_only_given_fields() {
        let conn = open_memory_database().unwrap();
        let donor = seed_donor(&conn, "Farah", BloodGroup::BPositive, "Jaipur", "Rajasthan");

        let update = DonorUpdate {
            phone: Some("+91 11111 22222".into()),
            available_to_donate: Some(false),
            last_donation_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        };
        update_donor(&conn, &donor.user_id, &update).unwrap();

        let read = get_donor_by_user(&conn, &donor.user_id).unwrap().unwrap();
        assert_eq!(read.phone, "+91 11111 22222");
        assert!(!read.available_to_donate);
        assert_eq!(read.last_donation_date, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert_eq!(read.full_name, donor.full_name);
        assert_eq!(read.city, donor.city);
    }

    #[test]
    fn update_without_donor_row_is_not_found() {
        let conn = open_memory_database().unwrap();
        let user = make_account(&conn, "ghost@example.com");
        let update = DonorUpdate {
            city: Some("Agra".into()),
            ..Default::default()
        };
        let err = update_donor(&conn, &user, &update).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn matching_contacts_require_group_city_and_availability() {
        let conn = open_memory_database().unwrap();
        seed_donor(&conn, "Hari", BloodGroup::AbNegative, "Surat", "Gujarat");
        let busy = seed_donor(&conn, "Indu", BloodGroup::AbNegative, "Surat", "Gujarat");
        seed_donor(&conn, "Jai", BloodGroup::AbNegative, "Vadodara", "Gujarat");
        seed_donor(&conn, "Kiran", BloodGroup::AbPositive, "Surat", "Gujarat");
        update_donor(
            &conn,
            &busy.user_id,
            &DonorUpdate {
                available_to_donate: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let filter = MatchFilter {
            blood_group: BloodGroup::AbNegative,
            city: "Surat".into(),
            available_only: true,
        };
        let contacts = find_matching_donor_contacts(&conn, &filter).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].full_name, "Hari");
    }

    #[test]
    fn count_donors_splits_active() {
        let conn = open_memory_database().unwrap();
        assert_eq!(count_donors(&conn).unwrap(), (0, 0));

        seed_donor(&conn, "Lata", BloodGroup::APositive, "Pune", "Maharashtra");
        let off = seed_donor(&conn, "Mohan", BloodGroup::APositive, "Pune", "Maharashtra");
        update_donor(
            &conn,
            &off.user_id,
            &DonorUpdate {
                available_to_donate: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(count_donors(&conn).unwrap(), (2, 1));
    }
}
