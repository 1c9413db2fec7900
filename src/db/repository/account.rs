use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_datetime, now_timestamp, parse_datetime, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Account, AccountCredentials};

pub fn insert_account(
    conn: &Connection,
    id: &Uuid,
    email: &str,
    full_name: Option<&str>,
    password_hash: &[u8],
    password_salt: &[u8],
) -> Result<Account, DatabaseError> {
    let created_at = now_timestamp();
    conn.execute(
        "INSERT INTO accounts (id, email, full_name, password_hash, password_salt, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id.to_string(),
            email,
            full_name,
            password_hash,
            password_salt,
            format_datetime(&created_at),
        ],
    )?;
    Ok(Account {
        id: *id,
        email: email.to_string(),
        full_name: full_name.map(str::to_string),
        created_at,
    })
}

/// Look up stored credentials by email (case-insensitive).
pub fn get_credentials_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<(Account, AccountCredentials)>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, email, full_name, created_at, password_hash, password_salt
             FROM accounts WHERE LOWER(email) = LOWER(?1)",
            params![email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Vec<u8>>(4)?,
                    row.get::<_, Vec<u8>>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((id, email, full_name, created_at, hash, salt)) = row else {
        return Ok(None);
    };
    let id = parse_uuid(&id)?;
    Ok(Some((
        Account {
            id,
            email,
            full_name,
            created_at: parse_datetime(&created_at)?,
        },
        AccountCredentials {
            account_id: id,
            password_hash: hash,
            password_salt: salt,
        },
    )))
}
