//! Error types for tool operations.

use std::time::Duration;

use database::{DatabaseError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Missing required parameter.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// Invalid parameter value.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// A field failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The requested slot is already held by a confirmed appointment.
    #[error("{0}")]
    Conflict(String),

    /// The target record does not exist or is not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// A backing service (database, calendar) failed.
    #[error("Service error: {0}")]
    Collaborator(String),

    /// The dispatch deadline passed before the operation finished.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error category reported to the model alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Collaborator,
    Timeout,
    Cancelled,
    UnknownOperation,
}

impl ToolError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            ToolError::MissingParameter(_)
            | ToolError::InvalidParameter { .. }
            | ToolError::Validation(_)
            | ToolError::Json(_) => ErrorKind::Validation,
            ToolError::Conflict(_) => ErrorKind::Conflict,
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::Collaborator(_) => ErrorKind::Collaborator,
            ToolError::Timeout(_) => ErrorKind::Timeout,
            ToolError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<DatabaseError> for ToolError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SlotTaken { date, time } => {
                ToolError::Conflict(format!("slot already booked: {} at {}", date, time))
            }
            DatabaseError::NotFound { entity, id } => {
                ToolError::NotFound(format!("{} not found: {}", entity, id))
            }
            other => ToolError::Collaborator(other.to_string()),
        }
    }
}
