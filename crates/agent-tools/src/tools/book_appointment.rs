//! Conflict-checked booking.

use std::sync::Arc;

use async_trait::async_trait;
use database::{validation, AppointmentStore, NewAppointment};
use serde_json::{json, Value};
use tracing::info;

use super::{contact_number, optional_text};
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolEffect, ToolOutput};

/// Validated arguments of `book_appointment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookAppointmentArgs {
    pub contact_number: String,
    pub appointment_date: String,
    pub appointment_time: String,
    pub service_type: Option<String>,
    pub notes: Option<String>,
}

impl BookAppointmentArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        Ok(Self {
            contact_number: contact_number(args)?,
            appointment_date: validation::normalize_date(&args.get_string("appointment_date")?)?,
            appointment_time: validation::normalize_time(&args.get_string("appointment_time")?)?,
            service_type: optional_text(args, "service_type")?,
            notes: optional_text(args, "notes")?,
        })
    }
}

impl From<BookAppointmentArgs> for NewAppointment {
    fn from(args: BookAppointmentArgs) -> Self {
        NewAppointment {
            contact_number: args.contact_number,
            appointment_date: args.appointment_date,
            appointment_time: args.appointment_time,
            service_type: args.service_type,
            notes: args.notes,
        }
    }
}

/// Books a slot for the caller.
///
/// Fails with a conflict, and writes nothing, if another confirmed
/// appointment already holds the slot.
pub struct BookAppointment {
    store: Arc<dyn AppointmentStore>,
}

impl BookAppointment {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for BookAppointment {
    fn name(&self) -> &str {
        "book_appointment"
    }

    fn description(&self) -> &str {
        "Book an appointment slot for the caller. Fails if the slot is already taken."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contact_number": {"type": "string", "description": "Caller's phone number"},
                "appointment_date": {"type": "string", "description": "Date as YYYY-MM-DD"},
                "appointment_time": {"type": "string", "description": "Time as HH:MM (24h)"},
                "service_type": {"type": "string", "description": "Kind of appointment"},
                "notes": {"type": "string", "description": "Anything the caller wants noted"}
            },
            "required": ["contact_number", "appointment_date", "appointment_time"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let new: NewAppointment = BookAppointmentArgs::parse(&args)?.into();
        let appointment = self.store.insert_confirmed_appointment(&new).await?;

        info!(
            "Booked appointment {} for {} at {}",
            appointment.id, appointment.appointment_date, appointment.appointment_time
        );

        let message = format!(
            "Appointment booked for {} at {}",
            appointment.appointment_date, appointment.appointment_time
        );
        Ok(ToolOutput::success(message, json!(appointment))
            .with_effect(ToolEffect::Booked(appointment)))
    }
}
