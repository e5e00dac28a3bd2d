//! Input validation for caller-supplied fields.
//!
//! Dates and times are normalized here so that the slot uniqueness index
//! always compares canonical values (`2024-01-15`, `09:00`).

use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid contact number.
    InvalidContactNumber(String),
    /// Date not in `YYYY-MM-DD` form.
    InvalidDate(String),
    /// Time not in `HH:MM` form.
    InvalidTime(String),
    /// Unknown appointment status.
    InvalidStatus(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidContactNumber(msg) => {
                write!(f, "Invalid contact number: {}", msg)
            }
            ValidationError::InvalidDate(value) => {
                write!(f, "Invalid date '{}': expected YYYY-MM-DD", value)
            }
            ValidationError::InvalidTime(value) => {
                write!(f, "Invalid time '{}': expected HH:MM", value)
            }
            ValidationError::InvalidStatus(value) => write!(
                f,
                "Invalid status '{}': expected confirmed, cancelled or completed",
                value
            ),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for contact numbers.
pub const MAX_CONTACT_LENGTH: usize = 32;

/// Minimum number of digits in a contact number.
pub const MIN_CONTACT_DIGITS: usize = 7;

/// Maximum allowed length for free-text fields (service type, notes, names).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Validate an email address (basic RFC 5322 format check).
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "malformed domain".to_string(),
        ));
    }

    Ok(())
}

/// Validate a contact number and return its trimmed form.
///
/// Accepts digits with optional `+`, spaces, dashes, dots and parentheses,
/// and requires at least [`MIN_CONTACT_DIGITS`] digits.
pub fn validate_contact_number(contact: &str) -> Result<String, ValidationError> {
    let contact = contact.trim();

    if contact.is_empty() {
        return Err(ValidationError::Empty("contact_number".to_string()));
    }

    if contact.len() > MAX_CONTACT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "contact_number".to_string(),
            max: MAX_CONTACT_LENGTH,
            actual: contact.len(),
        });
    }

    if let Some(c) = contact
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.' | '(' | ')')))
    {
        return Err(ValidationError::InvalidContactNumber(format!(
            "unexpected character '{}'",
            c
        )));
    }

    let digits = contact.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_CONTACT_DIGITS {
        return Err(ValidationError::InvalidContactNumber(format!(
            "needs at least {} digits",
            MIN_CONTACT_DIGITS
        )));
    }

    Ok(contact.to_string())
}

/// Validate a date and return it as `YYYY-MM-DD`.
pub fn normalize_date(date: &str) -> Result<String, ValidationError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ValidationError::Empty("date".to_string()));
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| ValidationError::InvalidDate(date.to_string()))
}

/// Validate a time and return it as `HH:MM` (24h). Seconds are accepted
/// and dropped.
pub fn normalize_time(time: &str) -> Result<String, ValidationError> {
    let time = time.trim();
    if time.is_empty() {
        return Err(ValidationError::Empty("time".to_string()));
    }

    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidTime(time.to_string()))
}

/// Validate an optional free-text field, dropping blank values.
pub fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if value.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
            actual: value.len(),
        });
    }

    Ok(Some(value.to_string()))
}
