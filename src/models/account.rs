use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sign-in identity. Password material never leaves the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Stored credential pair for an account.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_id: Uuid,
    pub password_hash: Vec<u8>,
    pub password_salt: Vec<u8>,
}
