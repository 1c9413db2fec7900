use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_datetime, now_timestamp};
use crate::db::DatabaseError;
use crate::models::enums::AppRole;

/// Grant a role to an account. Granting an already held role is a no-op.
///
/// There is no HTTP path to this; roles are assigned out-of-band.
pub fn grant_role(conn: &Connection, user_id: &Uuid, role: AppRole) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_roles (id, user_id, role, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            Uuid::new_v4().to_string(),
            user_id.to_string(),
            role.as_str(),
            format_datetime(&now_timestamp()),
        ],
    )?;
    Ok(())
}

/// True when a role row with the given tag exists for the account.
pub fn has_role(conn: &Connection, user_id: &Uuid, role: AppRole) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM user_roles WHERE user_id = ?1 AND role = ?2",
        params![user_id.to_string(), role.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::make_account;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn grant_and_check_admin_role() {
        let conn = open_memory_database().unwrap();
        let user = make_account(&conn, "admin@example.com");

        assert!(!has_role(&conn, &user, AppRole::Admin).unwrap());
        grant_role(&conn, &user, AppRole::Admin).unwrap();
        assert!(has_role(&conn, &user, AppRole::Admin).unwrap());
        assert!(!has_role(&conn, &user, AppRole::User).unwrap());
    }

    #[test]
    fn granting_twice_keeps_one_row() {
        let conn = open_memory_database().unwrap();
        let user = make_account(&conn, "admin@example.com");
        grant_role(&conn, &user, AppRole::Admin).unwrap();
        grant_role(&conn, &user, AppRole::Admin).unwrap();

        let rows: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM user_roles WHERE user_id = ?1",
                params![user.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
        assert!(has_role(&conn, &user, AppRole::Admin).unwrap());
    }

    #[test]
    fn role_requires_existing_account() {
        let conn = open_memory_database().unwrap();
        let result = grant_role(&conn, &Uuid::new_v4(), AppRole::Admin);
        assert!(result.is_err());
    }
}
