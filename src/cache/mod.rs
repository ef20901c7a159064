//! 响应缓存模块：按提示词与配置指纹缓存生成结果。
//!
//! # Response Caching Module
//!
//! Memoizes generation results keyed by the formatted prompt plus the full
//! request configuration, so repeated identical requests skip the underlying
//! generation function.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Typed JSON layer with key prefixing and statistics |
//! | [`CacheConfig`] | TTL, enable switch, size limit, key prefix |
//! | [`CacheBackend`] | Trait for pluggable storage |
//! | [`MemoryCache`] | In-process LRU backend |
//! | [`DiskCache`] | One file per entry under a directory |
//! | [`NullCache`] | No-op backend |
//! | [`CacheKeyGenerator`] | Request fingerprinting |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_textgen::cache::{CacheConfig, CacheManager, MemoryCache};
//!
//! let cache = CacheManager::new(
//!     CacheConfig::new().with_key_prefix("custom"),
//!     Box::new(MemoryCache::new(1000)),
//! );
//! assert_eq!(cache.backend_name(), "memory");
//! ```
//!
//! There is no get-or-compute locking: two concurrent identical requests may
//! both miss and both store, and the later store wins.

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, DiskCache, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyGenerator};
pub use manager::{CacheConfig, CacheManager, CacheStats};
