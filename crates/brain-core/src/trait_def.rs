//! The collaborator trait definitions.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BrainError;
use crate::message::Turn;
use crate::tools::{TokenUsage, ToolCallRequest, ToolDefinition};

/// What the model decided to do with its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum BrainAction {
    /// Say something to the user.
    Speak(String),
    /// Invoke one or more cataloged operations before speaking.
    CallTools(Vec<ToolCallRequest>),
}

/// A model turn plus the usage it reported.
#[derive(Debug, Clone, PartialEq)]
pub struct BrainReply {
    pub action: BrainAction,
    pub usage: Option<TokenUsage>,
}

impl BrainReply {
    /// A natural-language reply.
    pub fn speak(text: impl Into<String>) -> Self {
        Self {
            action: BrainAction::Speak(text.into()),
            usage: None,
        }
    }

    /// A batch of tool calls.
    pub fn call_tools(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            action: BrainAction::CallTools(calls),
            usage: None,
        }
    }

    /// Attach token usage to the reply.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// The dialogue model.
///
/// Given the transcript so far and the operation catalog, returns either a
/// reply to speak or tool calls to execute. Implementations can range from
/// scripted test doubles to hosted LLM clients. This trait is object-safe and
/// can be used as `Arc<dyn Brain>`.
#[async_trait]
pub trait Brain: Send + Sync {
    /// Produce the next model turn.
    async fn respond(
        &self,
        transcript: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<BrainReply, BrainError>;

    /// Get a human-readable name for this brain implementation.
    fn name(&self) -> &str;

    /// Check if the brain is ready to process turns.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

/// Text produced by a summarizer call.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryText {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl SummaryText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }

    /// Attach token usage to the summary.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// The summarization service used when a session ends.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a finished transcript.
    ///
    /// `booked_appointments` holds JSON snapshots of the appointments the
    /// session touched. The call may fail; callers must tolerate that.
    async fn summarize(
        &self,
        transcript: &[Turn],
        booked_appointments: &[Value],
    ) -> Result<SummaryText, BrainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_constructors() {
        let reply = BrainReply::speak("Hello").with_usage(TokenUsage::new(10, 2));
        assert_eq!(reply.action, BrainAction::Speak("Hello".to_string()));
        assert_eq!(reply.usage.map(|u| u.total()), Some(12));

        let call = ToolCallRequest::new("1", "end_conversation", Default::default());
        let reply = BrainReply::call_tools(vec![call.clone()]);
        assert_eq!(reply.action, BrainAction::CallTools(vec![call]));
        assert!(reply.usage.is_none());
    }
}
