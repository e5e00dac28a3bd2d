//! Error types for collaborator calls.

use thiserror::Error;

/// Errors that can occur while consulting the model or the summarizer.
#[derive(Debug, Error)]
pub enum BrainError {
    /// The collaborator is temporarily unavailable.
    #[error("brain unavailable: {0}")]
    Unavailable(String),

    /// The request could not be processed.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The collaborator returned something that could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A timeout occurred during processing.
    #[error("processing timed out")]
    Timeout,
}
