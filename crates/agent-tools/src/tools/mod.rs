//! The scheduling operations exposed to the model.
//!
//! Each tool parses its loosely-typed argument bag into a typed argument
//! struct before touching the store, so every validation failure surfaces
//! before any write.

mod book_appointment;
mod cancel_appointment;
mod end_conversation;
mod fetch_slots;
mod identify_user;
mod modify_appointment;
mod retrieve_appointments;

pub use book_appointment::{BookAppointment, BookAppointmentArgs};
pub use cancel_appointment::{CancelAppointment, CancelAppointmentArgs};
pub use end_conversation::EndConversation;
pub use fetch_slots::{FetchSlots, FetchSlotsArgs};
pub use identify_user::{IdentifyUser, IdentifyUserArgs};
pub use modify_appointment::{ModifyAppointment, ModifyAppointmentArgs};
pub use retrieve_appointments::{RetrieveAppointments, RetrieveAppointmentsArgs};

use database::validation;

use crate::error::ToolError;
use crate::tool::ToolArgs;

/// Names of every scheduling operation, in catalog order.
pub const OPERATION_NAMES: [&str; 7] = [
    "identify_user",
    "fetch_slots",
    "book_appointment",
    "retrieve_appointments",
    "cancel_appointment",
    "modify_appointment",
    "end_conversation",
];

fn contact_number(args: &ToolArgs) -> Result<String, ToolError> {
    Ok(validation::validate_contact_number(
        &args.get_string("contact_number")?,
    )?)
}

fn optional_date(args: &ToolArgs, key: &str) -> Result<Option<String>, ToolError> {
    args.get_string_opt(key)?
        .map(|d| validation::normalize_date(&d))
        .transpose()
        .map_err(ToolError::from)
}

fn optional_time(args: &ToolArgs, key: &str) -> Result<Option<String>, ToolError> {
    args.get_string_opt(key)?
        .map(|t| validation::normalize_time(&t))
        .transpose()
        .map_err(ToolError::from)
}

fn optional_text(args: &ToolArgs, key: &str) -> Result<Option<String>, ToolError> {
    let value = args.get_string_opt(key)?;
    Ok(validation::optional_text(key, value.as_deref())?)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::sync::Arc;

    use database::Database;
    use serde_json::Value;

    use crate::tool::ToolArgs;

    pub async fn memory_db() -> Arc<Database> {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        Arc::new(db)
    }

    pub fn args(value: Value) -> ToolArgs {
        let params: HashMap<String, Value> = serde_json::from_value(value).unwrap();
        ToolArgs::new(params)
    }
}
