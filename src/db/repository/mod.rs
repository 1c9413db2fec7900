//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table. All public functions are re-exported here.

mod account;
mod donor;
mod role;
mod urgent_request;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;

pub use account::*;
pub use donor::*;
pub use role::*;
pub use urgent_request::*;

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

pub(crate) fn parse_datetime(value: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad timestamp {value}: {e}")))
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("bad date {value}: {e}")))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Escape `%`, `_` and `\` so user text is matched literally inside LIKE.
pub(crate) fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Current wall-clock time truncated to whole seconds, the stored precision.
pub(crate) fn now_timestamp() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    parse_datetime(&format_datetime(&now)).unwrap_or(now)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Pune"), "Pune");
    }

    #[test]
    fn datetime_round_trips_at_second_precision() {
        let now = now_timestamp();
        assert_eq!(parse_datetime(&format_datetime(&now)).unwrap(), now);
    }

    #[test]
    fn parse_uuid_rejects_garbage() {
        assert!(parse_uuid("not-a-uuid").is_err());
    }
}
