//! Standard response envelope returned by every generator.

use super::message::Message;
use serde::{Deserialize, Serialize};

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: Vec<Message>,
    #[serde(default)]
    pub logprobs: Vec<serde_json::Value>,
    #[serde(default)]
    pub usage: JsonMap,
    #[serde(default)]
    pub config: JsonMap,
}

impl GenerationResponse {
    /// Wrap a single raw completion. Log probabilities, usage and config stay empty.
    pub fn from_raw(output: impl Into<String>) -> Self {
        Self {
            text: vec![Message::system(output)],
            ..Default::default()
        }
    }

    /// Content of the first returned message, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.text.first().map(|m| m.content.as_str())
    }
}
