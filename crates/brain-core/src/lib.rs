//! Core contracts for the dialogue model and the summarization service.
//!
//! The scheduling engine never generates language itself. It hands the
//! transcript and the operation catalog to a [`Brain`], which answers with
//! either a reply to speak or a set of tool calls, and it hands finished
//! transcripts to a [`Summarizer`]. This crate defines:
//!
//! - [`Brain`] / [`Summarizer`] - collaborator traits
//! - [`Turn`] / [`Role`] - transcript entries
//! - [`BrainReply`] / [`BrainAction`] - what a model turn produced
//! - [`ToolCallRequest`] / [`ToolDefinition`] - tool call wire types
//! - [`BrainError`] - errors for collaborator calls
//!
//! # Example
//!
//! ```rust
//! use brain_core::{async_trait, Brain, BrainError, BrainReply, ToolDefinition, Turn};
//!
//! struct Polite;
//!
//! #[async_trait]
//! impl Brain for Polite {
//!     async fn respond(
//!         &self,
//!         _transcript: &[Turn],
//!         _tools: &[ToolDefinition],
//!     ) -> Result<BrainReply, BrainError> {
//!         Ok(BrainReply::speak("How can I help you today?"))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Polite"
//!     }
//! }
//! ```

mod error;
mod message;
mod tools;
mod trait_def;

pub use error::BrainError;
pub use message::{Role, Turn};
pub use tools::{FunctionDefinition, TokenUsage, ToolCallRequest, ToolDefinition};
pub use trait_def::{Brain, BrainAction, BrainReply, SummaryText, Summarizer};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
