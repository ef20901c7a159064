//! File- and environment-driven generator settings.
//!
//! ```yaml
//! provider: local-llama
//! cache:
//!   backend: disk
//!   dir: /var/cache/textgen
//!   ttl_secs: 86400
//! tokens:
//!   chars_per_token: 3.5
//! ```

use crate::cache::{CacheBackend, CacheConfig, CacheManager, DiskCache, MemoryCache, NullCache};
use crate::generator::{CustomGenerator, CustomGeneratorBuilder, TextGenerationFunction, DEFAULT_PROVIDER};
use crate::tokens::CharacterEstimator;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable naming a YAML settings file.
pub const CONFIG_ENV: &str = "AI_LIB_TEXTGEN_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub provider: String,
    pub cache: CacheSettings,
    pub tokens: TokenSettings,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            cache: CacheSettings::default(),
            tokens: TokenSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CacheBackendSettings {
    Memory {
        #[serde(default = "default_max_entries")]
        max_entries: usize,
    },
    Disk {
        dir: PathBuf,
    },
    None,
}

fn default_max_entries() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(flatten)]
    pub backend: CacheBackendSettings,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    /// Defaults to the provider label.
    #[serde(default)]
    pub key_prefix: Option<String>,
    /// Unlimited when absent.
    #[serde(default)]
    pub max_entry_size: Option<usize>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendSettings::Memory {
                max_entries: default_max_entries(),
            },
            ttl_secs: None,
            key_prefix: None,
            max_entry_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    pub chars_per_token: f64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self { chars_per_token: 4.0 }
    }
}

impl GeneratorSettings {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Load from the file named by [`CONFIG_ENV`], or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(invalid("provider", "provider label must not be empty"));
        }
        if let CacheBackendSettings::Memory { max_entries: 0 } = self.cache.backend {
            return Err(invalid("cache.max_entries", "must be at least 1"));
        }
        if !(self.tokens.chars_per_token > 0.0) {
            return Err(invalid("tokens.chars_per_token", "must be positive"));
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        let prefix = self
            .cache
            .key_prefix
            .clone()
            .unwrap_or_else(|| self.provider.clone());
        let mut cfg = CacheConfig::new()
            .with_key_prefix(prefix)
            .with_enabled(!matches!(self.cache.backend, CacheBackendSettings::None));
        if let Some(limit) = self.cache.max_entry_size {
            cfg = cfg.with_max_entry_size(limit);
        }
        if let Some(secs) = self.cache.ttl_secs {
            cfg = cfg.with_ttl(Duration::from_secs(secs));
        }
        cfg
    }

    pub async fn build_cache(&self) -> Result<CacheManager> {
        let backend: Box<dyn CacheBackend> = match &self.cache.backend {
            CacheBackendSettings::Memory { max_entries } => Box::new(MemoryCache::new(*max_entries)),
            CacheBackendSettings::Disk { dir } => Box::new(DiskCache::open(dir).await?),
            CacheBackendSettings::None => Box::new(NullCache::new()),
        };
        Ok(CacheManager::new(self.cache_config(), backend))
    }

    /// Builder preloaded with these settings; callers may still override parts.
    pub async fn builder(
        &self,
        function: impl TextGenerationFunction + 'static,
    ) -> Result<CustomGeneratorBuilder> {
        let cache = self.build_cache().await?;
        Ok(CustomGenerator::builder(function)
            .provider(self.provider.clone())
            .cache(Arc::new(cache))
            .token_counter(Arc::new(CharacterEstimator::with_ratio(
                self.tokens.chars_per_token,
            ))))
    }
}

fn invalid(field: &str, msg: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("generator_settings"),
    )
}
