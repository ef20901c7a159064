//! Token counter implementations.

use crate::types::{Message, Prompt};
use std::collections::HashMap;
use std::sync::RwLock;

/// Fixed overhead charged for every chat message (role framing and separators).
pub const TOKENS_PER_MESSAGE: usize = 4;
/// Tokens that prime the assistant reply after a conversation.
pub const REPLY_PRIMING_TOKENS: usize = 2;

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    fn count_messages(&self, messages: &[Message]) -> usize {
        let mut total = 0;
        for message in messages {
            total += TOKENS_PER_MESSAGE;
            total += self.count(&message.role);
            total += self.count(&message.content);
        }
        total + REPLY_PRIMING_TOKENS
    }

    fn count_prompt(&self, prompt: &Prompt) -> usize {
        match prompt {
            Prompt::Text(text) => self.count(text),
            Prompt::Messages(messages) => self.count_messages(messages),
        }
    }
}

/// Fast length-based approximation.
#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: f64,
}
impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4.0)
    }
    /// Non-positive ratios fall back to the default of 4.
    pub fn with_ratio(r: f64) -> Self {
        let r = if r > 0.0 { r } else { 4.0 };
        Self { chars_per_token: r }
    }
}
impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}
impl TokenCounter for CharacterEstimator {
    fn count(&self, text: &str) -> usize {
        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}

/// Memoizes another counter; stops remembering new texts once `max_size` is reached.
pub struct CachingCounter {
    inner: Box<dyn TokenCounter>,
    cache: RwLock<HashMap<String, usize>>,
    max_size: usize,
}
impl CachingCounter {
    pub fn new(inner: Box<dyn TokenCounter>, max_size: usize) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            max_size,
        }
    }
    pub fn clear_cache(&self) {
        if let Ok(mut c) = self.cache.write() {
            c.clear();
        }
    }
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}
impl TokenCounter for CachingCounter {
    fn count(&self, text: &str) -> usize {
        if let Ok(c) = self.cache.read() {
            if let Some(&n) = c.get(text) {
                return n;
            }
        }
        let n = self.inner.count(text);
        if let Ok(mut c) = self.cache.write() {
            if c.len() < self.max_size {
                c.insert(text.to_string(), n);
            }
        }
        n
    }
}
