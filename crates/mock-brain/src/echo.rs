//! Echo brain implementation - repeats the caller back.

use async_trait::async_trait;
use brain_core::{Brain, BrainError, BrainReply, ToolDefinition, Turn};

/// A brain that speaks the caller's last utterance back, never calling tools.
///
/// Useful for exercising the turn flow without any model.
#[derive(Debug, Clone, Default)]
pub struct EchoBrain {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBrain {
    /// Create a new EchoBrain with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBrain with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_brain::EchoBrain;
    ///
    /// let brain = EchoBrain::with_prefix("You said: ");
    /// // Will respond with "You said: <last utterance>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Brain for EchoBrain {
    async fn respond(
        &self,
        transcript: &[Turn],
        _tools: &[ToolDefinition],
    ) -> Result<BrainReply, BrainError> {
        let last = transcript
            .iter()
            .rev()
            .find(|turn| turn.is_user())
            .map(|turn| turn.content.as_str())
            .unwrap_or_default();

        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last),
            None => last.to_string(),
        };
        Ok(BrainReply::speak(text))
    }

    fn name(&self) -> &str {
        "EchoBrain"
    }
}
