//! Error types for orchestrator operations.

use agent_tools::ToolError;
use brain_core::BrainError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The session has ended and accepts no further events.
    #[error("session ended: {0}")]
    SessionEnded(String),

    /// The model collaborator failed or timed out.
    #[error("brain error: {0}")]
    Brain(#[from] BrainError),

    /// The dispatcher rejected a call outright (unknown operation).
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),

    /// The model kept requesting tools without producing a reply.
    #[error("model requested tools for {0} rounds without replying")]
    ToolLoopLimit(usize),

    /// Persistence failed outside of a tool call.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
}
