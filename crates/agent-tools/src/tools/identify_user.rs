//! Caller identification.

use std::sync::Arc;

use async_trait::async_trait;
use database::{validation, AppointmentStore};
use serde_json::{json, Value};
use tracing::debug;

use super::{contact_number, optional_text};
use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolEffect, ToolOutput};

/// Validated arguments of `identify_user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyUserArgs {
    pub contact_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentifyUserArgs {
    pub fn parse(args: &ToolArgs) -> Result<Self, ToolError> {
        let contact_number = contact_number(args)?;
        let name = optional_text(args, "name")?;
        let email = args.get_string_opt("email")?.map(|e| e.trim().to_string());
        if let Some(email) = &email {
            validation::validate_email(email)?;
        }

        Ok(Self {
            contact_number,
            name,
            email,
        })
    }
}

/// Creates or refreshes the caller's record.
///
/// Present fields overwrite stored ones; absent fields keep their stored
/// value, so repeated identification is idempotent.
pub struct IdentifyUser {
    store: Arc<dyn AppointmentStore>,
}

impl IdentifyUser {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for IdentifyUser {
    fn name(&self) -> &str {
        "identify_user"
    }

    fn description(&self) -> &str {
        "Identify the caller by contact number, optionally recording their name and email. \
         Call this before booking or looking up appointments."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "contact_number": {
                    "type": "string",
                    "description": "Caller's phone number, e.g. +15551234567"
                },
                "name": {"type": "string", "description": "Caller's name"},
                "email": {"type": "string", "description": "Caller's email address"}
            },
            "required": ["contact_number"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let args = IdentifyUserArgs::parse(&args)?;
        debug!("Identifying caller {}", args.contact_number);

        let user = self
            .store
            .upsert_user(&args.contact_number, args.name.as_deref(), args.email.as_deref())
            .await?;

        let message = match &user.name {
            Some(name) => format!("Identified {}", name),
            None => "Caller identified".to_string(),
        };
        Ok(ToolOutput::success(message, json!(user)).with_effect(ToolEffect::Identified(user)))
    }
}
