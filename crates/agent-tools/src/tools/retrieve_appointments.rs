//! Appointment lookup.

use std::sync::Arc;

use async_trait::async_trait;
use database::{AppointmentStatus, AppointmentStore};
use serde_json::{json, Value};

use super::contact_number;
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Validated arguments of `retrieve_appointments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveAppointmentsArgs {
    pub contact_number: String,
    pub status: Option<AppointmentStatus>,
}

impl RetrieveAppointmentsArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        let status = args
            .get_string_opt("status")?
            .map(|s| AppointmentStatus::parse(&s))
            .transpose()?;

        Ok(Self {
            contact_number: contact_number(args)?,
            status,
        })
    }
}

/// Lists the caller's appointments, most recent slot first.
pub struct RetrieveAppointments {
    store: Arc<dyn AppointmentStore>,
}

impl RetrieveAppointments {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for RetrieveAppointments {
    fn name(&self) -> &str {
        "retrieve_appointments"
    }

    fn description(&self) -> &str {
        "List the caller's appointments, most recent first, optionally filtered by status."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contact_number": {"type": "string", "description": "Caller's phone number"},
                "status": {
                    "type": "string",
                    "enum": ["confirmed", "cancelled", "completed"],
                    "description": "Only return appointments in this state"
                }
            },
            "required": ["contact_number"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let args = RetrieveAppointmentsArgs::parse(&args)?;
        let appointments = self
            .store
            .list_appointments(&args.contact_number, args.status)
            .await?;

        Ok(ToolOutput::success(
            format!("Found {} appointments", appointments.len()),
            json!({"count": appointments.len(), "appointments": appointments}),
        ))
    }
}
