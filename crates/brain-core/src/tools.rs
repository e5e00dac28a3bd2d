//! Tool call wire types shared between the engine and the model.
//!
//! The engine advertises its operation catalog as [`ToolDefinition`]s in the
//! OpenAI function-calling format, and the model answers with
//! [`ToolCallRequest`]s naming one of those operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type (always "function" for function tools).
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function specification.
    pub function: FunctionDefinition,
}

/// Function definition for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function.
    pub name: String,
    /// Description of what the function does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the function parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a function tool definition.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters,
            },
        }
    }

    /// The function name.
    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// A model-issued request to invoke one cataloged operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique ID for this tool call (provider-assigned).
    pub id: String,
    /// Name of the operation to execute.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

impl ToolCallRequest {
    /// Create a request from already-parsed arguments.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: HashMap<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Parse arguments from a JSON string.
    pub fn from_call(
        id: String,
        name: String,
        arguments_json: &str,
    ) -> Result<Self, serde_json::Error> {
        let arguments: HashMap<String, Value> = if arguments_json.trim().is_empty() {
            HashMap::new()
        } else {
            serde_json::from_str(arguments_json)?
        };
        Ok(Self {
            id,
            name,
            arguments,
        })
    }

    /// Get a string argument by name.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Token usage reported by a model or summarizer call, used for billing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens produced by the completion.
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Create a usage record.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Total tokens billed.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_parsing() {
        let request = ToolCallRequest::from_call(
            "call-1".to_string(),
            "fetch_slots".to_string(),
            r#"{"date": "2024-01-15"}"#,
        )
        .unwrap();

        assert_eq!(request.name, "fetch_slots");
        assert_eq!(request.get_string("date"), Some("2024-01-15"));
        assert_eq!(request.get_string("missing"), None);
    }

    #[test]
    fn test_tool_call_empty_arguments() {
        let request =
            ToolCallRequest::from_call("call-2".to_string(), "end_conversation".to_string(), "")
                .unwrap();
        assert!(request.arguments.is_empty());
    }

    #[test]
    fn test_tool_call_rejects_non_object() {
        let result =
            ToolCallRequest::from_call("call-3".to_string(), "fetch_slots".to_string(), "[1, 2]");
        assert!(result.is_err());
    }

    #[test]
    fn test_definition_serializes_as_function() {
        let tool = ToolDefinition::function(
            "end_conversation",
            "End the call",
            serde_json::json!({"type": "object", "properties": {}}),
        );
        assert_eq!(tool.name(), "end_conversation");

        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("\"type\":\"function\""));
        assert!(json.contains("End the call"));
    }

    #[test]
    fn test_usage_total() {
        assert_eq!(TokenUsage::new(1200, 300).total(), 1500);
        assert_eq!(TokenUsage::default().total(), 0);
    }
}
