//! Ephemeral analytics counters and session markers.
//!
//! Counters re-arm a 48-hour expiry on every increment, so active
//! counters never expire and idle ones fall away. All operations fail
//! open: a store error reads as 0 / drops the write.

use super::KvStore;
use std::sync::Arc;
use tracing::warn;

/// 48 hours.
const COUNTER_TTL_SECS: u64 = 172_800;

/// Counter store over the key-value seam.
#[derive(Debug, Clone)]
pub struct CounterStore {
    kv: Arc<dyn KvStore>,
}

impl CounterStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        CounterStore { kv }
    }

    fn counter_key(key: &str) -> String {
        format!("counter:{}", key)
    }

    fn session_key(key: &str) -> String {
        format!("session:{}", key)
    }

    /// Atomically increment a counter, re-arming its expiry. Returns the
    /// new value, or 0 if the store is unavailable.
    pub async fn increment(&self, key: &str) -> i64 {
        match self.kv.incr(&Self::counter_key(key), COUNTER_TTL_SECS).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %key, "counter increment dropped: {}", err);
                0
            }
        }
    }

    /// Current counter value; 0 for an absent key or unavailable store.
    pub async fn get(&self, key: &str) -> i64 {
        match self.kv.get(&Self::counter_key(key)).await {
            Ok(Some(raw)) => raw.parse().unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                warn!(key = %key, "counter read failed, reporting 0: {}", err);
                0
            }
        }
    }

    /// Set a session marker if absent. Returns true iff this call created
    /// it — the primitive for counting a view only once per session.
    /// False when the store is unavailable (the view is simply not
    /// counted).
    pub async fn set_session_marker(&self, key: &str, ttl_secs: u64) -> bool {
        match self
            .kv
            .set_if_absent(&Self::session_key(key), "1", ttl_secs)
            .await
        {
            Ok(created) => created,
            Err(err) => {
                warn!(key = %key, "session marker dropped: {}", err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn counters() -> CounterStore {
        CounterStore::new(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn test_increment_and_get() {
        let c = counters();
        assert_eq!(c.get("views:1").await, 0);
        assert_eq!(c.increment("views:1").await, 1);
        assert_eq!(c.increment("views:1").await, 2);
        assert_eq!(c.get("views:1").await, 2);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let c = counters();
        c.increment("a").await;
        assert_eq!(c.get("b").await, 0);
    }

    #[tokio::test]
    async fn test_session_marker_only_first_call_creates() {
        let c = counters();
        assert!(c.set_session_marker("view:42:sess-1", 60).await);
        assert!(!c.set_session_marker("view:42:sess-1", 60).await);
        assert!(c.set_session_marker("view:42:sess-2", 60).await);
    }
}
