//! Tool trait definition and types.

use std::collections::HashMap;

use async_trait::async_trait;
use database::{Appointment, User};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ToolError};

/// Arguments passed to a tool for execution.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    /// Parameters as key-value pairs.
    pub params: HashMap<String, Value>,
}

impl ToolArgs {
    /// Create new tool arguments with the given parameters.
    pub fn new(params: HashMap<String, Value>) -> Self {
        Self { params }
    }

    /// Get a string parameter, returning an error if missing, blank or not a string.
    pub fn get_string(&self, key: &str) -> Result<String, ToolError> {
        let value = self
            .params
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?
            .as_str()
            .ok_or_else(|| ToolError::InvalidParameter {
                name: key.to_string(),
                reason: "expected string".to_string(),
            })?;

        if value.trim().is_empty() {
            return Err(ToolError::MissingParameter(key.to_string()));
        }
        Ok(value.to_string())
    }

    /// Get an optional string parameter. Null and blank values count as absent.
    pub fn get_string_opt(&self, key: &str) -> Result<Option<String>, ToolError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ToolError::InvalidParameter {
                name: key.to_string(),
                reason: "expected string".to_string(),
            }),
        }
    }

    /// Get an integer ID parameter. Models often send IDs as strings, so a
    /// numeric string is accepted too.
    pub fn get_id(&self, key: &str) -> Result<i64, ToolError> {
        let value = self
            .params
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))?;

        let invalid = || ToolError::InvalidParameter {
            name: key.to_string(),
            reason: "expected integer id".to_string(),
        };

        match value {
            Value::Number(n) => n.as_i64().ok_or_else(invalid),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

/// Side effect of a successful tool call that the session must fold in.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    /// The caller was identified.
    Identified(User),
    /// A new appointment was booked.
    Booked(Appointment),
    /// An existing appointment was cancelled or rescheduled.
    Updated(Appointment),
    /// The model asked to end the conversation.
    EndConversation,
}

/// Uniform result envelope of a dispatched tool call.
///
/// Serialized as `{success, message|error, error_kind, payload}` and handed
/// back to the model as the content of a tool-result turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the execution was successful.
    pub success: bool,
    /// Short description of what happened, on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error message, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error category, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Structured result data.
    #[serde(default)]
    pub payload: Value,
    #[serde(skip)]
    pub effect: Option<ToolEffect>,
}

impl ToolOutput {
    /// Create a successful output.
    pub fn success(message: impl Into<String>, payload: Value) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            error_kind: None,
            payload,
            effect: None,
        }
    }

    /// Create a failed output from an error.
    pub fn failure(error: &ToolError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            payload: Value::Null,
            effect: None,
        }
    }

    /// Attach the session effect of this call.
    pub fn with_effect(mut self, effect: ToolEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Render the envelope as JSON for the transcript.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"success":{},"error":"unserializable result"}}"#,
                self.success
            )
        })
    }
}

/// Trait for operations the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name (used for dispatch).
    fn name(&self) -> &str;

    /// Human-readable description advertised to the model.
    fn description(&self) -> &str;

    /// JSON Schema of the accepted arguments.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}
