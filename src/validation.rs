//! Input validation shared by the registration and urgent-request forms.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Collects missing required fields so one error can name all of them.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `field` as missing when `value` is empty after trimming.
    pub fn check(&mut self, field: &'static str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.missing.push(field);
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::MissingFields(std::mem::take(&mut self.missing)))
        }
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"))
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email_regex().is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::Invalid {
            field: "email",
            reason: "expected an address like name@example.com".into(),
        })
    }
}

pub fn parse_iso_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::Invalid {
        field,
        reason: format!("expected YYYY-MM-DD, got {value:?}"),
    })
}

/// Trim, and map blank text to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields_collects_all_missing() {
        let err = RequiredFields::new()
            .check("hospital_name", "")
            .check("city", "  ")
            .check("contact_number", "12345")
            .finish()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["hospital_name", "city"]));
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: hospital_name, city"
        );
    }

    #[test]
    fn required_fields_ok_when_present() {
        assert!(RequiredFields::new().check("city", "Pune").finish().is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("asha@example").is_err());
        assert!(validate_email("asha example.com").is_err());
    }

    #[test]
    fn iso_date_parsing() {
        assert_eq!(
            parse_iso_date("date_of_birth", "1990-05-17").unwrap(),
            NaiveDate::from_ymd_opt(1990, 5, 17).unwrap()
        );
        assert!(parse_iso_date("date_of_birth", "17/05/1990").is_err());
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  note ".into())), Some("note".into()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
