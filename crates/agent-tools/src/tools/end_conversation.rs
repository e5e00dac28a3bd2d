//! End-of-call signal.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolEffect, ToolOutput};

/// Signals that the conversation is over. Touches no state itself; the
/// orchestrator seals the session when it sees the effect.
#[derive(Debug, Default)]
pub struct EndConversation;

impl EndConversation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for EndConversation {
    fn name(&self) -> &str {
        "end_conversation"
    }

    fn description(&self) -> &str {
        "End the call once the caller has nothing else to schedule."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reason": {"type": "string", "description": "Why the call is ending"}
            }
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let reason = args.get_string_opt("reason")?;
        Ok(
            ToolOutput::success("Conversation ended", json!({"ended": true, "reason": reason}))
                .with_effect(ToolEffect::EndConversation),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::args;

    #[tokio::test]
    async fn test_end_signal() {
        let output = EndConversation::new().execute(args(json!({}))).await.unwrap();
        assert!(output.success);
        assert_eq!(output.effect, Some(ToolEffect::EndConversation));
    }
}
