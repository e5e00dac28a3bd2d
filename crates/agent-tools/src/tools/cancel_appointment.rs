//! Cancellation.

use std::sync::Arc;

use async_trait::async_trait;
use database::{AppointmentStatus, AppointmentStore};
use serde_json::{json, Value};
use tracing::info;

use super::contact_number;
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolEffect, ToolOutput};

/// Validated arguments of `cancel_appointment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAppointmentArgs {
    pub contact_number: String,
    pub appointment_id: i64,
}

impl CancelAppointmentArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            contact_number: contact_number(args)?,
            appointment_id: args.get_id("appointment_id")?,
        })
    }
}

/// Cancels one of the caller's confirmed appointments.
pub struct CancelAppointment {
    store: Arc<dyn AppointmentStore>,
}

impl CancelAppointment {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CancelAppointment {
    fn name(&self) -> &str {
        "cancel_appointment"
    }

    fn description(&self) -> &str {
        "Cancel one of the caller's confirmed appointments by id."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contact_number": {"type": "string", "description": "Caller's phone number"},
                "appointment_id": {"type": "integer", "description": "Id of the appointment"}
            },
            "required": ["contact_number", "appointment_id"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let args = CancelAppointmentArgs::parse(&args)?;

        let cancelled = self
            .store
            .set_status(
                args.appointment_id,
                &args.contact_number,
                AppointmentStatus::Cancelled,
            )
            .await?
            .ok_or_else(|| {
                ToolError::NotFound(format!(
                    "No confirmed appointment {} found for this caller",
                    args.appointment_id
                ))
            })?;

        info!("Cancelled appointment {}", cancelled.id);

        Ok(ToolOutput::success(
            format!(
                "Appointment on {} at {} cancelled",
                cancelled.appointment_date, cancelled.appointment_time
            ),
            json!(cancelled),
        )
        .with_effect(ToolEffect::Updated(cancelled)))
    }
}
