//! Cache key generation.

use crate::types::GenerationConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
    pub fn as_str(&self) -> &str { &self.hash }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.hash) }
}

impl From<&str> for CacheKey { fn from(s: &str) -> Self { Self::new(s) } }
impl From<String> for CacheKey { fn from(s: String) -> Self { Self::new(s) } }

/// Builds request fingerprints from the formatted prompt and the full config.
///
/// The canonical form is `{"config": {...}, "messages": "<prompt>"}` serialized
/// with sorted object keys, so logically identical requests always hash alike.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyGenerator {
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self { Self { salt: None } }
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self { self.salt = Some(salt.into()); self }

    /// Canonical JSON that is hashed into the key.
    pub fn canonical(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let mut parts = serde_json::Map::new();
        parts.insert("messages".into(), serde_json::Value::String(prompt.to_string()));
        parts.insert("config".into(), serde_json::Value::Object(config.to_map()?));
        if let Some(ref s) = self.salt {
            parts.insert("salt".into(), serde_json::Value::String(s.clone()));
        }
        Ok(serde_json::to_string(&parts)?)
    }

    pub fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<CacheKey> {
        let canonical = self.canonical(prompt, config)?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Ok(CacheKey::new(hash))
    }
}
