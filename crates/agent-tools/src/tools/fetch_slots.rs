//! Slot listing.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::optional_date;
use crate::error::ToolError;
use crate::slots::SlotCatalog;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Validated arguments of `fetch_slots`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSlotsArgs {
    pub date: Option<String>,
}

impl FetchSlotsArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            date: optional_date(args, "date")?,
        })
    }
}

/// Lists calendar slots marked available.
///
/// Does not consult the appointment store; booking is where conflicts are
/// detected.
pub struct FetchSlots {
    catalog: Arc<dyn SlotCatalog>,
}

impl FetchSlots {
    pub fn new(catalog: Arc<dyn SlotCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for FetchSlots {
    fn name(&self) -> &str {
        "fetch_slots"
    }

    fn description(&self) -> &str {
        "List available appointment slots, optionally for a single date."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date": {
                    "type": "string",
                    "description": "Date to list slots for, as YYYY-MM-DD. Omit for all dates."
                }
            }
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let args = FetchSlotsArgs::parse(&args)?;
        let slots = self.catalog.available_slots(args.date.as_deref()).await?;

        let message = match &args.date {
            Some(date) => format!("Found {} available slots on {}", slots.len(), date),
            None => format!("Found {} available slots", slots.len()),
        };
        Ok(ToolOutput::success(
            message,
            json!({"date": args.date, "count": slots.len(), "slots": slots}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::StaticCalendar;
    use crate::tools::test_support::args;

    #[tokio::test]
    async fn test_fetch_by_date() {
        let tool = FetchSlots::new(Arc::new(StaticCalendar::sample()));

        let output = tool.execute(args(json!({"date": "2024-01-15"}))).await.unwrap();
        assert!(output.success);
        assert_eq!(output.payload["count"], 5);
        assert_eq!(output.payload["slots"][0]["time"], "09:00");

        let output = tool.execute(args(json!({}))).await.unwrap();
        assert_eq!(output.payload["count"], 7);
        assert!(output.payload["date"].is_null());
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_date() {
        let tool = FetchSlots::new(Arc::new(StaticCalendar::sample()));
        let err = tool.execute(args(json!({"date": "tomorrow"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
