//! Bookable slot catalog.
//!
//! Availability here comes from a static calendar and is not reconciled
//! with the appointment store: a slot listed as available may already be
//! held by a confirmed appointment.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A `(date, time)` pair from the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    /// Time as `HH:MM`.
    pub time: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Slot {
    pub fn new(date: impl Into<String>, time: impl Into<String>, available: bool) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            available,
        }
    }
}

/// Read-only provider of bookable slots.
#[async_trait]
pub trait SlotCatalog: Send + Sync {
    /// Available slots, optionally restricted to one date, in calendar order.
    async fn available_slots(&self, date: Option<&str>) -> Result<Vec<Slot>, ToolError>;
}

/// Calendar backed by a fixed list of slots.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    slots: Vec<Slot>,
}

impl StaticCalendar {
    /// Build a calendar from slots. Dates and times are normalized; invalid
    /// entries are rejected.
    pub fn new(slots: Vec<Slot>) -> Result<Self, ToolError> {
        let mut normalized = slots
            .into_iter()
            .map(|slot| {
                Ok(Slot {
                    date: database::validation::normalize_date(&slot.date)?,
                    time: database::validation::normalize_time(&slot.time)?,
                    available: slot.available,
                })
            })
            .collect::<Result<Vec<_>, ToolError>>()?;

        normalized.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
        Ok(Self { slots: normalized })
    }

    /// The built-in demo calendar.
    pub fn sample() -> Self {
        let mut slots: Vec<Slot> = ["09:00", "10:00", "11:00", "14:00", "15:00"]
            .iter()
            .map(|time| Slot::new("2024-01-15", *time, true))
            .collect();
        slots.push(Slot::new("2024-01-16", "09:00", true));
        slots.push(Slot::new("2024-01-16", "10:00", false));
        slots.push(Slot::new("2024-01-16", "13:00", true));

        Self { slots }
    }

    /// Parse a JSON array of `{date, time, available}` objects.
    pub fn from_json_str(json: &str) -> Result<Self, ToolError> {
        let slots: Vec<Slot> = serde_json::from_str(json)?;
        Self::new(slots)
    }

    /// Load a calendar file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ToolError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ToolError::Collaborator(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Every slot, including unavailable ones.
    pub fn all(&self) -> &[Slot] {
        &self.slots
    }
}

#[async_trait]
impl SlotCatalog for StaticCalendar {
    async fn available_slots(&self, date: Option<&str>) -> Result<Vec<Slot>, ToolError> {
        Ok(self
            .slots
            .iter()
            .filter(|slot| slot.available)
            .filter(|slot| date.map_or(true, |d| slot.date == d))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_calendar() {
        let calendar = StaticCalendar::sample();

        let day = calendar.available_slots(Some("2024-01-15")).await.unwrap();
        assert_eq!(day.len(), 5);
        assert_eq!(day[0].time, "09:00");

        let next = calendar.available_slots(Some("2024-01-16")).await.unwrap();
        assert_eq!(next.len(), 2);
        assert!(next.iter().all(|s| s.available));

        let all = calendar.available_slots(None).await.unwrap();
        assert_eq!(all.len(), 7);
        assert!(calendar.available_slots(Some("2030-01-01")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_from_json_normalizes_and_sorts() {
        let calendar = StaticCalendar::from_json_str(
            r#"[
                {"date": "2024-02-01", "time": "14:00:00"},
                {"date": "2024-02-01", "time": "09:30", "available": false},
                {"date": "2024-01-31", "time": "16:00", "available": true}
            ]"#,
        )
        .unwrap();

        let all = calendar.all();
        assert_eq!(all[0].date, "2024-01-31");
        assert_eq!(all[1].time, "09:30");
        assert_eq!(all[2].time, "14:00");

        let available = calendar.available_slots(Some("2024-02-01")).await.unwrap();
        assert_eq!(available, vec![Slot::new("2024-02-01", "14:00", true)]);
    }

    #[test]
    fn test_from_json_rejects_bad_dates() {
        let result = StaticCalendar::from_json_str(r#"[{"date": "15/01/2024", "time": "09:00"}]"#);
        assert!(matches!(result, Err(ToolError::Validation(_))));
        assert!(StaticCalendar::from_json_str("not json").is_err());
        assert!(StaticCalendar::from_json_file("/nonexistent/slots.json").is_err());
    }
}
