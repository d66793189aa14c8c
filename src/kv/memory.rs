//! In-memory implementation of the key-value store seam.
//!
//! Used by tests and as a degraded single-process fallback when Redis is
//! unreachable at startup. Honors TTLs lazily on access.

use super::{KvError, KvStore};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(HashSet<String>),
    /// Sliding-window entries as (score_ms, member) pairs.
    Window(Vec<(i64, String)>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at_ms: Option<i64>,
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    inner: Mutex<HashMap<String, Entry>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn live_entry<'a>(map: &'a mut HashMap<String, Entry>, key: &str) -> Option<&'a mut Entry> {
        let expired = map
            .get(key)
            .and_then(|e| e.expires_at_ms)
            .map(|at| at <= Self::now_ms())
            .unwrap_or(false);
        if expired {
            map.remove(key);
        }
        map.get_mut(key)
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut map = self.inner.lock().unwrap();
        match Self::live_entry(&mut map, key) {
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => Ok(Some(s.clone())),
            _ => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), KvError> {
        let mut map = self.inner.lock().unwrap();
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at_ms: Some(Self::now_ms() + ttl_secs as i64 * 1000),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), KvError> {
        let mut map = self.inner.lock().unwrap();
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }

    async fn set_add(&self, key: &str, members: &[String], ttl_secs: u64) -> Result<(), KvError> {
        let mut map = self.inner.lock().unwrap();
        let expires_at_ms = Some(Self::now_ms() + ttl_secs as i64 * 1000);
        let exists = Self::live_entry(&mut map, key)
            .map(|e| matches!(e.value, Value::Set(_)))
            .unwrap_or(false);
        if !exists {
            map.insert(
                key.to_string(),
                Entry {
                    value: Value::Set(HashSet::new()),
                    expires_at_ms,
                },
            );
        }
        if let Some(entry) = map.get_mut(key) {
            if let Value::Set(set) = &mut entry.value {
                set.extend(members.iter().cloned());
            }
            entry.expires_at_ms = expires_at_ms;
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut map = self.inner.lock().unwrap();
        match Self::live_entry(&mut map, key) {
            Some(Entry {
                value: Value::Set(set),
                ..
            }) => Ok(set.iter().cloned().collect()),
            _ => Ok(Vec::new()),
        }
    }

    async fn incr(&self, key: &str, ttl_secs: u64) -> Result<i64, KvError> {
        let mut map = self.inner.lock().unwrap();
        let expires_at_ms = Some(Self::now_ms() + ttl_secs as i64 * 1000);
        let next = match Self::live_entry(&mut map, key) {
            Some(Entry {
                value: Value::Str(s),
                ..
            }) => s.parse::<i64>().unwrap_or(0) + 1,
            _ => 1,
        };
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Str(next.to_string()),
                expires_at_ms,
            },
        );
        Ok(next)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<bool, KvError> {
        let mut map = self.inner.lock().unwrap();
        if Self::live_entry(&mut map, key).is_some() {
            return Ok(false);
        }
        map.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at_ms: Some(Self::now_ms() + ttl_secs as i64 * 1000),
            },
        );
        Ok(true)
    }

    async fn window_admit(
        &self,
        key: &str,
        now_ms: i64,
        window_ms: i64,
        member: &str,
    ) -> Result<u64, KvError> {
        let mut map = self.inner.lock().unwrap();
        let window_start = now_ms - window_ms;

        let exists = Self::live_entry(&mut map, key)
            .map(|e| matches!(e.value, Value::Window(_)))
            .unwrap_or(false);
        if !exists {
            map.insert(
                key.to_string(),
                Entry {
                    value: Value::Window(Vec::new()),
                    expires_at_ms: None,
                },
            );
        }

        let entry = map.get_mut(key).expect("window entry present");
        let count = match &mut entry.value {
            Value::Window(entries) => {
                entries.retain(|(score, _)| *score > window_start);
                let count = entries.len() as u64;
                entries.push((now_ms, member.to_string()));
                count
            }
            _ => 0,
        };
        entry.expires_at_ms = Some(Self::now_ms() + window_ms.max(1000));
        Ok(count)
    }
}
