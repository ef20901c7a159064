//! Conversation messages and prompt input.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

/// Role name that is rendered without a `role: ` prefix when formatting.
pub const SYSTEM_ROLE: &str = "system";

/// A single role/content pair in a conversation.
///
/// Roles are free-form strings; only `"system"` has special meaning to the
/// prompt formatter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(SYSTEM_ROLE, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new("assistant", text)
    }

    pub fn is_system(&self) -> bool {
        self.role == SYSTEM_ROLE
    }
}

/// Input accepted by a generator: either a pre-formatted prompt or a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    /// Already formatted; passed to the generation function verbatim.
    Text(String),
    Messages(Vec<Message>),
}

impl Prompt {
    /// Parse a prompt from loosely-typed JSON.
    ///
    /// Accepts a string or an array of objects. Every array element must carry
    /// string `role` and `content` fields.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(Prompt::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| message_from_json(i, item))
                .collect::<Result<Vec<_>>>()
                .map(Prompt::Messages),
            other => Err(Error::validation_with_context(
                "prompt must be a string or an array of messages",
                ErrorContext::new()
                    .with_field_path("messages")
                    .with_details(format!("got {}", json_kind(other)))
                    .with_source("prompt_parser"),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Prompt::Text(s) => s.is_empty(),
            Prompt::Messages(m) => m.is_empty(),
        }
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        Prompt::Text(s.to_string())
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::Text(s)
    }
}

impl From<Vec<Message>> for Prompt {
    fn from(m: Vec<Message>) -> Self {
        Prompt::Messages(m)
    }
}

impl From<&[Message]> for Prompt {
    fn from(m: &[Message]) -> Self {
        Prompt::Messages(m.to_vec())
    }
}

fn message_from_json(index: usize, item: &serde_json::Value) -> Result<Message> {
    let field = |name: &str| -> Result<String> {
        item.get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::validation_with_context(
                    format!("message is missing a string `{}`", name),
                    ErrorContext::new()
                        .with_field_path(format!("messages[{}].{}", index, name))
                        .with_source("prompt_parser"),
                )
            })
    };
    Ok(Message::new(field("role")?, field("content")?))
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
