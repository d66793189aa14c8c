//! Read-through JSON cache with tag-based bulk invalidation.
//!
//! Key layout (stable public contract):
//! - values:        `cache:{namespace}:{key}`
//! - forward index: `cache:tags:{namespace}:{key}` (set of tags)
//! - reverse index: `cache:tag:{tag}:keys` (set of `{namespace}:{key}`)
//!
//! Every operation fails open: a store error reads as a miss and writes
//! are dropped with a warning. The cache must never be required for
//! correctness.

use super::KvStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_TTL_SECS: u64 = 3600;

/// Options for a cache write.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// TTL in seconds; defaults to 3600.
    pub ttl_secs: Option<u64>,
    /// Key namespace; defaults to "default".
    pub namespace: Option<String>,
    /// Tags registering this key for bulk invalidation.
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// JSON cache over the key-value store seam.
#[derive(Debug, Clone)]
pub struct CacheStore {
    kv: Arc<dyn KvStore>,
    default_ttl_secs: u64,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        CacheStore {
            kv,
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    pub fn with_default_ttl(mut self, ttl_secs: u64) -> Self {
        self.default_ttl_secs = ttl_secs;
        self
    }

    fn scoped(namespace: Option<&str>, key: &str) -> String {
        format!("{}:{}", namespace.unwrap_or(DEFAULT_NAMESPACE), key)
    }

    fn value_key(scoped: &str) -> String {
        format!("cache:{}", scoped)
    }

    fn forward_key(scoped: &str) -> String {
        format!("cache:tags:{}", scoped)
    }

    fn reverse_key(tag: &str) -> String {
        format!("cache:tag:{}:keys", tag)
    }

    /// Fetch and deserialize a cached value. Any store or decode problem
    /// reads as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, namespace: Option<&str>) -> Option<T> {
        let value_key = Self::value_key(&Self::scoped(namespace, key));
        match self.kv.get(&value_key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(key = %value_key, "cache entry failed to deserialize: {}", err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(key = %value_key, "cache read failed, treating as miss: {}", err);
                None
            }
        }
    }

    /// Serialize and store a value, registering its tags. Errors are
    /// logged and swallowed.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, opts: &CacheOptions) {
        let scoped = Self::scoped(opts.namespace.as_deref(), key);
        let value_key = Self::value_key(&scoped);
        let ttl = opts.ttl_secs.unwrap_or(self.default_ttl_secs);

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key = %value_key, "cache value failed to serialize: {}", err);
                return;
            }
        };

        if let Err(err) = self.kv.set_ex(&value_key, &raw, ttl).await {
            warn!(key = %value_key, "cache write dropped: {}", err);
            return;
        }

        if opts.tags.is_empty() {
            return;
        }
        if let Err(err) = self
            .kv
            .set_add(&Self::forward_key(&scoped), &opts.tags, ttl)
            .await
        {
            warn!(key = %value_key, "cache tag index write dropped: {}", err);
            return;
        }
        for tag in &opts.tags {
            if let Err(err) = self
                .kv
                .set_add(&Self::reverse_key(tag), &[scoped.clone()], ttl)
                .await
            {
                warn!(tag = %tag, "cache reverse tag index write dropped: {}", err);
            }
        }
    }

    /// Remove a single cached value and its forward tag index.
    pub async fn delete(&self, key: &str, namespace: Option<&str>) {
        let scoped = Self::scoped(namespace, key);
        let keys = vec![Self::value_key(&scoped), Self::forward_key(&scoped)];
        if let Err(err) = self.kv.delete(&keys).await {
            warn!(key = %keys[0], "cache delete dropped: {}", err);
        }
    }

    /// Delete every cache entry registered under `tag`, then the tag's
    /// reverse index itself.
    pub async fn invalidate_by_tag(&self, tag: &str) {
        let reverse_key = Self::reverse_key(tag);
        let scoped_keys = match self.kv.set_members(&reverse_key).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(tag = %tag, "tag invalidation skipped, store unavailable: {}", err);
                return;
            }
        };

        let mut to_delete = Vec::with_capacity(scoped_keys.len() * 2 + 1);
        for scoped in &scoped_keys {
            to_delete.push(Self::value_key(scoped));
            to_delete.push(Self::forward_key(scoped));
        }
        to_delete.push(reverse_key);

        if let Err(err) = self.kv.delete(&to_delete).await {
            warn!(tag = %tag, "tag invalidation delete dropped: {}", err);
        }
    }

    /// Canonical read-through: return the cached value if present, else
    /// invoke `fetch`, cache the result, and return it.
    ///
    /// No single-flight protection: concurrent misses for the same key
    /// each invoke `fetch` independently.
    pub async fn get_or_set<T, F, Fut, E>(
        &self,
        key: &str,
        opts: &CacheOptions,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key, opts.namespace.as_deref()).await {
            return Ok(hit);
        }
        let value = fetch().await?;
        self.set(key, &value, opts).await;
        Ok(value)
    }
}
