//! Cache manager.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use super::backend::CacheBackend;
use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};

/// Behavior shared by every request going through a [`CacheManager`].
///
/// `default_ttl = None` keeps entries until the backend evicts them.
/// `max_entry_size = None` stores entries of any size.
#[derive(Debug, Clone)]
pub struct CacheConfig { pub default_ttl: Option<Duration>, pub enabled: bool, pub max_entry_size: Option<usize>, pub key_prefix: Option<String> }

impl Default for CacheConfig {
    fn default() -> Self { Self { default_ttl: None, enabled: true, max_entry_size: None, key_prefix: None } }
}

impl CacheConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_ttl(mut self, ttl: Duration) -> Self { self.default_ttl = Some(ttl); self }
    pub fn with_enabled(mut self, enabled: bool) -> Self { self.enabled = enabled; self }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self { self.key_prefix = Some(prefix.into()); self }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self { self.max_entry_size = Some(bytes); self }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats { pub hits: u64, pub misses: u64, pub sets: u64, pub deletes: u64, pub errors: u64 }

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 { let total = self.hits + self.misses; if total == 0 { 0.0 } else { self.hits as f64 / total as f64 } }
}

struct AtomicStats { hits: AtomicU64, misses: AtomicU64, sets: AtomicU64, deletes: AtomicU64, errors: AtomicU64 }
impl AtomicStats {
    fn new() -> Self { Self { hits: AtomicU64::new(0), misses: AtomicU64::new(0), sets: AtomicU64::new(0), deletes: AtomicU64::new(0), errors: AtomicU64::new(0) } }
    fn to_stats(&self) -> CacheStats { CacheStats { hits: self.hits.load(Ordering::Relaxed), misses: self.misses.load(Ordering::Relaxed), sets: self.sets.load(Ordering::Relaxed), deletes: self.deletes.load(Ordering::Relaxed), errors: self.errors.load(Ordering::Relaxed) } }
}

/// Typed JSON layer over a [`CacheBackend`].
///
/// Backend failures and entries that no longer decode as `T` are returned to
/// the caller as errors.
pub struct CacheManager { config: CacheConfig, backend: Box<dyn CacheBackend>, stats: AtomicStats }

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self { Self { config, backend, stats: AtomicStats::new() } }

    pub fn config(&self) -> &CacheConfig { &self.config }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        if !self.config.enabled { return Ok(None); }
        let prefixed = self.prefix_key(key);
        match self.backend.get(&prefixed).await {
            Ok(Some(data)) => {
                match serde_json::from_slice(&data) {
                    Ok(val) => { self.stats.hits.fetch_add(1, Ordering::Relaxed); Ok(Some(val)) }
                    Err(e) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                        Err(Error::cache_with_context(
                            "cached entry does not decode",
                            ErrorContext::new().with_field_path(prefixed.hash.clone()).with_details(e.to_string()).with_source("cache_manager"),
                        ))
                    }
                }
            }
            Ok(None) => { self.stats.misses.fetch_add(1, Ordering::Relaxed); Ok(None) }
            Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> { self.set_with_ttl(key, value, self.config.default_ttl).await }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Option<Duration>) -> Result<()> {
        if !self.config.enabled { return Ok(()); }
        let data = serde_json::to_vec(value)?;
        if let Some(limit) = self.config.max_entry_size {
            if data.len() > limit {
                tracing::debug!(key = %key, size = data.len(), limit, "entry too large, not cached");
                return Ok(());
            }
        }
        let prefixed = self.prefix_key(key);
        match self.backend.set(&prefixed, &data, ttl).await { Ok(()) => { self.stats.sets.fetch_add(1, Ordering::Relaxed); Ok(()) } Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) } }
    }

    pub async fn delete(&self, key: &CacheKey) -> Result<bool> {
        if !self.config.enabled { return Ok(false); }
        let prefixed = self.prefix_key(key);
        match self.backend.delete(&prefixed).await { Ok(d) => { if d { self.stats.deletes.fetch_add(1, Ordering::Relaxed); } Ok(d) } Err(e) => { self.stats.errors.fetch_add(1, Ordering::Relaxed); Err(e) } }
    }

    pub async fn clear(&self) -> Result<()> { self.backend.clear().await }
    pub async fn len(&self) -> Result<usize> { self.backend.len().await }

    pub fn stats(&self) -> CacheStats { self.stats.to_stats() }
    pub fn backend_name(&self) -> &'static str { self.backend.name() }

    fn prefix_key(&self, key: &CacheKey) -> CacheKey {
        if let Some(ref p) = self.config.key_prefix { CacheKey::new(format!("{}:{}", p, key.hash)) } else { key.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let m = CacheManager::new(CacheConfig::new(), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        assert_eq!(m.get::<String>(&k).await.unwrap(), None);
        m.set(&k, &"v".to_string()).await.unwrap();
        assert_eq!(m.get::<String>(&k).await.unwrap().as_deref(), Some("v"));
        let s = m.stats();
        assert_eq!((s.hits, s.misses, s.sets), (1, 1, 1));
        assert_eq!(s.hit_ratio(), 0.5);
    }

    #[tokio::test]
    async fn test_prefix_is_applied() {
        let a = CacheManager::new(CacheConfig::new().with_key_prefix("a"), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        a.set(&k, &1u32).await.unwrap();
        assert_eq!(a.prefix_key(&k).hash, "a:k");
    }

    #[tokio::test]
    async fn test_disabled_manager_is_inert() {
        let m = CacheManager::new(CacheConfig::new().with_enabled(false), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        m.set(&k, &1u32).await.unwrap();
        assert_eq!(m.get::<u32>(&k).await.unwrap(), None);
        assert_eq!(m.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_large_entries_are_stored_by_default() {
        let m = CacheManager::new(CacheConfig::new(), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        let big = "y".repeat(11 * 1024 * 1024);
        m.set(&k, &big).await.unwrap();
        assert_eq!(m.get::<String>(&k).await.unwrap().map(|s| s.len()), Some(big.len()));
    }

    #[tokio::test]
    async fn test_oversized_entries_are_skipped_when_limited() {
        let m = CacheManager::new(CacheConfig::new().with_max_entry_size(4), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        m.set(&k, &"far too long").await.unwrap();
        assert_eq!(m.get::<String>(&k).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_an_error() {
        let m = CacheManager::new(CacheConfig::new(), Box::new(MemoryCache::new(8)));
        let k = CacheKey::new("k");
        m.set(&k, &"text").await.unwrap();
        let err = m.get::<u32>(&k).await.unwrap_err();
        assert!(matches!(err, Error::Cache { .. }));
        assert_eq!(m.stats().errors, 1);
        assert_eq!(m.backend_name(), "memory");
    }
}
