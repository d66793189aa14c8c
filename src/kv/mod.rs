//! Key-value store abstraction for ephemeral state (cache, counters,
//! rate-limit windows).
//!
//! The store is an optimization layer only: durable invariants live in the
//! relational store, and every consumer of this module fails open when the
//! backing store is unreachable. The trait mirrors the semantic operations
//! the consumers need rather than raw store commands, so a production
//! Redis client and an in-memory test double can sit behind the same seam.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod cache;
pub mod counters;
pub mod memory;
pub mod rate_limit;
pub mod redis;

pub use cache::{CacheOptions, CacheStore};
pub use counters::CounterStore;
pub use memory::MemoryKv;
pub use rate_limit::{RateLimitDecision, RateLimiter};
pub use redis::RedisKv;

/// Error type for key-value store operations.
///
/// Consumers treat any variant as "store unavailable" and fail open.
#[derive(Debug, Clone, Error)]
pub enum KvError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

impl From<::redis::RedisError> for KvError {
    fn from(err: ::redis::RedisError) -> Self {
        KvError::Unavailable(err.to_string())
    }
}

/// Semantic operations over the ephemeral key-value store.
#[async_trait]
pub trait KvStore: Send + Sync + fmt::Debug {
    /// Fetch a string value, `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Store a string value with a TTL in seconds.
    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError>;

    /// Delete the given keys. Missing keys are not an error.
    async fn delete(&self, keys: &[String]) -> Result<(), KvError>;

    /// Add members to a set and (re)arm its TTL.
    async fn set_add(&self, key: &str, members: &[String], ttl_secs: u64) -> Result<(), KvError>;

    /// All members of a set, empty if absent.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvError>;

    /// Atomically increment a counter and re-arm its TTL, returning the
    /// new value. Active counters never expire; idle ones do.
    async fn incr(&self, key: &str, ttl_secs: u64) -> Result<i64, KvError>;

    /// Set a value only if the key is absent. Returns true iff this call
    /// created it.
    async fn set_if_absent(&self, key: &str, value: &str, ttl_secs: u64)
        -> Result<bool, KvError>;

    /// Sliding-window admission step, executed as one atomic batch:
    /// prune entries with score <= `now_ms - window_ms`, count the
    /// remainder, add `member` at score `now_ms`, and re-arm the key's
    /// TTL to the window length. Returns the count *before* the add.
    async fn window_admit(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        member: &str,
    ) -> Result<u64, KvError>;
}
