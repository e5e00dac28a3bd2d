//! Transcript entries exchanged with the model.

use serde::{Deserialize, Serialize};

/// Who authored a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user (caller).
    User,
    /// The assistant, i.e. text produced by the model.
    Assistant,
    /// Instructions injected by the host.
    System,
    /// The outcome of a dispatched tool call.
    ToolResult,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::ToolResult => "tool_result",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in a session transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author of the turn.
    pub role: Role,
    /// Turn text. For tool results this is the JSON result envelope.
    pub content: String,
    /// Operation name, set on tool-result turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Turn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_name: None,
        }
    }

    /// Create a tool-result turn for the named operation.
    pub fn tool_result(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::ToolResult,
            content: content.into(),
            tool_name: Some(tool_name.into()),
        }
    }

    /// Whether the turn was authored by the end user.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        assert_eq!(Turn::user("hi").role, Role::User);
        assert_eq!(Turn::assistant("hello").role, Role::Assistant);
        assert_eq!(Turn::system("be brief").role, Role::System);

        let result = Turn::tool_result("fetch_slots", "{}");
        assert_eq!(result.role, Role::ToolResult);
        assert_eq!(result.tool_name.as_deref(), Some("fetch_slots"));
        assert!(!result.is_user());
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Turn::tool_result("end_conversation", "ok")).unwrap();
        assert!(json.contains("\"tool_result\""));
        assert!(json.contains("\"tool_name\":\"end_conversation\""));

        let json = serde_json::to_string(&Turn::user("hi")).unwrap();
        assert!(!json.contains("tool_name"));
    }
}
