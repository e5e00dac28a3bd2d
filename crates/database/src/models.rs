//! Database models.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::validation::ValidationError;

/// A caller, identified by contact number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Contact number (e.g., "+15551234567")
    pub contact_number: String,
    /// Display name, if the caller gave one
    pub name: Option<String>,
    /// Email address, if the caller gave one
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Lifecycle state of an appointment.
///
/// Appointments are created `Confirmed`. `Cancelled` and `Completed` are
/// terminal; `Completed` is only ever set by external post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Column value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    /// Parse a status filter supplied by a caller.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_lowercase().as_str() {
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// A stored appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning caller.
    pub contact_number: String,
    /// Date as `YYYY-MM-DD`.
    pub appointment_date: String,
    /// Time as `HH:MM` (24h).
    pub appointment_time: String,
    pub service_type: Option<String>,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for booking a new appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub contact_number: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub service_type: Option<String>,
    pub notes: Option<String>,
}

/// A persisted end-of-session summary. JSON columns are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConversationSummary {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Resolved caller, if any.
    pub contact_number: Option<String>,
    /// Session the summary was produced for (unique).
    pub session_id: String,
    /// Natural-language digest.
    pub summary: String,
    /// JSON array of appointment snapshots.
    pub booked_appointments: String,
    /// JSON array of preference tags.
    pub preferences: String,
    /// JSON object with the cost breakdown.
    pub cost_breakdown: String,
    pub created_at: String,
}

impl ConversationSummary {
    /// Decode the booked appointment snapshots.
    pub fn booked_appointments(&self) -> Result<Vec<Value>, serde_json::Error> {
        serde_json::from_str(&self.booked_appointments)
    }

    /// Decode the preference tags.
    pub fn preferences(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.preferences)
    }

    /// Decode the cost breakdown.
    pub fn cost_breakdown(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.cost_breakdown)
    }
}

/// Input for persisting a conversation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConversationSummary {
    pub contact_number: Option<String>,
    pub session_id: String,
    pub summary: String,
    pub booked_appointments: Vec<Value>,
    pub preferences: Vec<String>,
    pub cost_breakdown: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            AppointmentStatus::parse("Confirmed").unwrap(),
            AppointmentStatus::Confirmed
        );
        assert_eq!(
            AppointmentStatus::parse("canceled").unwrap(),
            AppointmentStatus::Cancelled
        );
        assert_eq!(
            AppointmentStatus::parse("completed").unwrap(),
            AppointmentStatus::Completed
        );
        assert!(AppointmentStatus::parse("pending").is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
