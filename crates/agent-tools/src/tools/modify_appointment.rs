//! Rescheduling.

use std::sync::Arc;

use async_trait::async_trait;
use database::AppointmentStore;
use serde_json::{json, Value};
use tracing::info;

use super::{contact_number, optional_date, optional_time};
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolEffect, ToolOutput};

/// Validated arguments of `modify_appointment`. At least one of the new
/// fields is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyAppointmentArgs {
    pub contact_number: String,
    pub appointment_id: i64,
    pub new_date: Option<String>,
    pub new_time: Option<String>,
}

impl ModifyAppointmentArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        let parsed = Self {
            contact_number: contact_number(args)?,
            appointment_id: args.get_id("appointment_id")?,
            new_date: optional_date(args, "new_date")?,
            new_time: optional_time(args, "new_time")?,
        };

        if parsed.new_date.is_none() && parsed.new_time.is_none() {
            return Err(ToolError::MissingParameter(
                "new_date or new_time".to_string(),
            ));
        }
        Ok(parsed)
    }
}

/// Moves one of the caller's confirmed appointments to a new date and/or
/// time.
///
/// The target slot is conflict-checked against every other confirmed
/// appointment; on conflict the original is left untouched.
pub struct ModifyAppointment {
    store: Arc<dyn AppointmentStore>,
}

impl ModifyAppointment {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ModifyAppointment {
    fn name(&self) -> &str {
        "modify_appointment"
    }

    fn description(&self) -> &str {
        "Reschedule one of the caller's confirmed appointments to a new date and/or time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contact_number": {"type": "string", "description": "Caller's phone number"},
                "appointment_id": {"type": "integer", "description": "Id of the appointment"},
                "new_date": {"type": "string", "description": "New date as YYYY-MM-DD"},
                "new_time": {"type": "string", "description": "New time as HH:MM (24h)"}
            },
            "required": ["contact_number", "appointment_id"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let args = ModifyAppointmentArgs::parse(&args)?;

        let updated = self
            .store
            .update_date_time(
                args.appointment_id,
                &args.contact_number,
                args.new_date.as_deref(),
                args.new_time.as_deref(),
            )
            .await?
            .ok_or_else(|| {
                ToolError::NotFound(format!(
                    "No confirmed appointment {} found for this caller",
                    args.appointment_id
                ))
            })?;

        info!(
            "Rescheduled appointment {} to {} at {}",
            updated.id, updated.appointment_date, updated.appointment_time
        );

        Ok(ToolOutput::success(
            format!(
                "Appointment moved to {} at {}",
                updated.appointment_date, updated.appointment_time
            ),
            json!(updated),
        )
        .with_effect(ToolEffect::Updated(updated)))
    }
}
