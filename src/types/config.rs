//! Per-request generation configuration.

use serde::{Deserialize, Serialize};

/// Sampling and caching options for a single `generate` call.
///
/// Only `use_cache` is interpreted by generators in this crate. Every other
/// field is carried through untouched, but all fields take part in the cache
/// fingerprint, so changing any of them yields a different cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub n: u32,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub top_p: f64,
    pub top_k: u32,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub stop: Option<Vec<String>>,
    pub use_cache: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            n: 1,
            temperature: 0.1,
            max_tokens: None,
            top_p: 1.0,
            top_k: 50,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            provider: None,
            model: None,
            stop: None,
            use_cache: true,
        }
    }
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// The configuration as a plain JSON mapping.
    pub fn to_map(&self) -> crate::Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Ok(serde_json::Map::new()),
        }
    }
}
