//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use base64::Engine as _;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Key-value storage consumed by [`super::CacheManager`].
///
/// `ttl = None` stores the entry until it is deleted or evicted.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> Result<()>;
    async fn delete(&self, key: &CacheKey) -> Result<bool>;
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            data,
            expires_at: ttl.map(|t| Instant::now() + t),
        }
    }
    fn is_expired(&self) -> bool {
        self.expires_at.map(|t| Instant::now() >= t).unwrap_or(false)
    }
}

/// In-process LRU cache.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    /// `max_entries` of zero is treated as one.
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, CacheEntry>>> {
        self.entries.lock().map_err(|_| {
            Error::cache_with_context(
                "memory cache lock poisoned",
                ErrorContext::new().with_source("memory_cache"),
            )
        })
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        match entries.get(&key.hash) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.data.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        entries.pop(&key.hash);
        Ok(None)
    }
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.lock()?
            .put(key.hash.clone(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.lock()?.pop(&key.hash).is_some())
    }
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self
            .lock()?
            .peek(&key.hash)
            .map(|e| !e.is_expired())
            .unwrap_or(false))
    }
    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(self.lock()?.iter().filter(|(_, e)| !e.is_expired()).count())
    }
    fn name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Serialize, Deserialize)]
struct DiskEntry {
    /// Unix epoch milliseconds.
    expires_at: Option<u64>,
    data: String,
}

/// Persistent cache storing one JSON file per key under a directory.
///
/// Each write goes to its own temporary file and is then renamed into place,
/// so readers never observe a half-written entry. Concurrent writers to the
/// same key race; the last rename wins. An entry that cannot be parsed is an
/// error, not a miss.
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Create the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            Error::cache_with_context(
                format!("cannot create cache directory: {}", e),
                ErrorContext::new()
                    .with_field_path(dir.display().to_string())
                    .with_source("disk_cache"),
            )
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        let digest: String = Sha256::digest(key.hash.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        self.dir.join(format!("{}.json", digest))
    }

    /// Unique per write, so concurrent writers never share a staging file.
    fn temp_path_for(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("entry");
        self.dir
            .join(format!("{}.{}.tmp", stem, uuid::Uuid::new_v4().simple()))
    }

    async fn read_entry(&self, path: &Path) -> Result<Option<DiskEntry>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(disk_error("read", path, e)),
        };
        serde_json::from_slice::<DiskEntry>(&raw)
            .map(Some)
            .map_err(|e| corrupt_entry(path, e.to_string()))
    }

    async fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        let mut rd = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| disk_error("list", &self.dir, e))?;
        while let Some(item) = rd
            .next_entry()
            .await
            .map_err(|e| disk_error("list", &self.dir, e))?
        {
            let path = item.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                out.push(path);
            }
        }
        Ok(out)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn is_live(entry: &DiskEntry) -> bool {
    entry.expires_at.map(|t| now_ms() < t).unwrap_or(true)
}

fn corrupt_entry(path: &Path, details: String) -> Error {
    Error::cache_with_context(
        "cache entry is corrupt",
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_details(details)
            .with_source("disk_cache"),
    )
}

fn disk_error(op: &str, path: &Path, e: std::io::Error) -> Error {
    Error::cache_with_context(
        format!("{} failed: {}", op, e),
        ErrorContext::new()
            .with_field_path(path.display().to_string())
            .with_source("disk_cache"),
    )
}

#[async_trait]
impl CacheBackend for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        let Some(entry) = self.read_entry(&path).await? else {
            return Ok(None);
        };
        if !is_live(&entry) {
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }
        base64::engine::general_purpose::STANDARD
            .decode(entry.data.as_bytes())
            .map(Some)
            .map_err(|e| corrupt_entry(&path, e.to_string()))
    }
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let path = self.path_for(key);
        let entry = DiskEntry {
            expires_at: ttl.map(|t| now_ms().saturating_add(t.as_millis() as u64)),
            data: base64::engine::general_purpose::STANDARD.encode(value),
        };
        let bytes = serde_json::to_vec(&entry)?;
        let tmp = self.temp_path_for(&path);
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| disk_error("write", &tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(disk_error("rename", &path, e));
        }
        Ok(())
    }
    async fn delete(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(disk_error("delete", &path, e)),
        }
    }
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let path = self.path_for(key);
        Ok(self.read_entry(&path).await?.map(|e| is_live(&e)).unwrap_or(false))
    }
    async fn clear(&self) -> Result<()> {
        for path in self.entry_files().await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(disk_error("delete", &path, e)),
            }
        }
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        let mut n = 0;
        for path in self.entry_files().await? {
            if self.read_entry(&path).await?.map(|e| is_live(&e)).unwrap_or(false) {
                n += 1;
            }
        }
        Ok(n)
    }
    fn name(&self) -> &'static str {
        "disk"
    }
}

pub struct NullCache;
impl NullCache {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Option<Duration>) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn exists(&self, _: &CacheKey) -> Result<bool> {
        Ok(false)
    }
    async fn clear(&self) -> Result<()> {
        Ok(())
    }
    async fn len(&self) -> Result<usize> {
        Ok(0)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}
