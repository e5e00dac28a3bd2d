//! Mock model and summarizer implementations for the scheduling assistant.
//!
//! This crate provides test doubles for the `Brain` and `Summarizer`
//! collaborators:
//! - `ScriptedBrain` - Plays back a fixed queue of replies
//! - `EchoBrain` - Repeats the caller's last utterance
//! - `DelayedBrain` - Wraps another brain with artificial delay
//! - `StaticSummarizer` - Always returns the same digest
//! - `DigestSummarizer` - Builds a digest from the transcript
//! - `FailingSummarizer` - Always fails
//!
//! No network access is involved, so these are safe to use in tests.
//!
//! # Example
//!
//! ```rust
//! use mock_brain::{Brain, BrainAction, BrainReply, ScriptedBrain, Turn};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_brain::BrainError> {
//!     let brain = ScriptedBrain::new(vec![
//!         ScriptedBrain::tool_call("fetch_slots", json!({"date": "2024-01-15"})),
//!         BrainReply::speak("I have five slots that day."),
//!     ]);
//!
//!     let reply = brain.respond(&[Turn::user("Any slots?")], &[]).await?;
//!     assert!(matches!(reply.action, BrainAction::CallTools(_)));
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod scripted;
mod summarizer;

// Re-export brain-core types for convenience
pub use brain_core::{
    async_trait, Brain, BrainAction, BrainError, BrainReply, Summarizer, SummaryText, TokenUsage,
    ToolCallRequest, Turn,
};

pub use delayed::DelayedBrain;
pub use echo::EchoBrain;
pub use scripted::ScriptedBrain;
pub use summarizer::{DigestSummarizer, FailingSummarizer, StaticSummarizer};
