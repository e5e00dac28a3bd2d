//! Operator input lines.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

/// One line typed by the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Something the caller said.
    Say(String),
    /// A reply spoken on the model's behalf.
    Reply(String),
    /// Run an operation as if the model had requested it.
    Tool {
        name: String,
        arguments: HashMap<String, Value>,
    },
    /// List the operation catalog.
    Tools,
    /// Show the session's cost breakdown.
    Costs,
    /// Dump the session as JSON.
    Session,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: /{0}")]
    Unknown(String),
    #[error("/{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("tool arguments must be a JSON object: {0}")]
    BadArguments(String),
}

pub const HELP_TEXT: &str = r#"Plain lines are caller utterances.

Commands:
  /tool <name> [json]   run an operation, e.g. /tool fetch_slots {"date": "2024-01-15"}
  /reply <text>         speak a reply on the model's behalf
  /tools                list operations
  /costs                show the cost breakdown
  /session              dump the session as JSON
  /help                 show this text
  /quit                 leave"#;

impl Command {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Some(Command::Say(line.to_string())));
        };

        let (word, tail) = match rest.split_once(char::is_whitespace) {
            Some((word, tail)) => (word, tail.trim()),
            None => (rest, ""),
        };

        let command = match word {
            "tool" => {
                let (name, json) = match tail.split_once(char::is_whitespace) {
                    Some((name, json)) => (name, json.trim()),
                    None => (tail, ""),
                };
                if name.is_empty() {
                    return Err(CommandError::MissingArgument("tool"));
                }
                let arguments = if json.is_empty() {
                    HashMap::new()
                } else {
                    serde_json::from_str(json)
                        .map_err(|e| CommandError::BadArguments(e.to_string()))?
                };
                Command::Tool {
                    name: name.to_string(),
                    arguments,
                }
            }
            "reply" if tail.is_empty() => return Err(CommandError::MissingArgument("reply")),
            "reply" => Command::Reply(tail.to_string()),
            "tools" => Command::Tools,
            "costs" => Command::Costs,
            "session" => Command::Session,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
