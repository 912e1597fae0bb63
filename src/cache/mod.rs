//! Key-value cache adapter.
//!
//! Backends report failures as [`CacheError`]; [`CacheClient`] swallows them
//! so callers only ever see a miss or a `false` write result.

pub mod memory;
pub mod upstash;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;

pub use memory::MemoryCache;
pub use upstash::UpstashCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend unreachable: {0}")]
    Unreachable(String),

    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Malformed cache response: {0}")]
    Malformed(String),
}

/// Raw string storage with per-entry TTL.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Injected cache handle. A handle without a backend behaves as a cache that
/// always misses and never stores anything.
#[derive(Clone, Default)]
pub struct CacheClient {
    backend: Option<Arc<dyn CacheBackend>>,
}

impl CacheClient {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    /// Picks Upstash when both URL and token are configured, then the
    /// in-process cache if enabled, otherwise a disabled handle.
    pub fn from_config(config: &CacheConfig) -> Self {
        if let (Some(url), Some(token)) = (non_empty(&config.url), non_empty(&config.token)) {
            match UpstashCache::new(url, token, config.timeout_seconds) {
                Ok(backend) => {
                    info!("Cache backend: Upstash Redis at {}", url);
                    return Self::new(Arc::new(backend));
                }
                Err(e) => warn!("Failed to build Upstash client, cache disabled: {}", e),
            }
            return Self::disabled();
        }

        if config.in_memory {
            info!("Cache credentials not set, using in-process cache");
            return Self::new(Arc::new(MemoryCache::new(config.memory_capacity)));
        }

        warn!("Cache credentials not set, caching disabled");
        Self::disabled()
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Returns `None` on a miss, when disabled, on backend failure, and when
    /// the stored value does not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let backend = self.backend.as_ref()?;

        let raw = match backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached value could not be decoded");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Value could not be encoded for cache");
                return false;
            }
        };

        match backend.set(key, raw, ttl).await {
            Ok(()) => {
                debug!(key, ttl_seconds = ttl.as_secs(), "Cache set");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Cache set failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(backend) = self.backend.as_ref() else {
            return false;
        };

        match backend.delete(key).await {
            Ok(()) => {
                debug!(key, "Cache delete");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "Cache delete failed");
                false
            }
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
