//! Sliding-window rate limiter over the key-value store seam.
//!
//! Each identifier holds a time-ordered set of request timestamps under
//! `{namespace}:{identifier}`. Admission prunes entries older than the
//! trailing window, counts what remains, and unconditionally records the
//! current request — all as one atomic batch in the store. Availability
//! beats strict enforcement: any store error allows the request.

use super::KvStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::TimeMs;

/// Outcome of a rate-limit check, consumed by request middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    /// Unix seconds at which the trailing window has fully rotated.
    pub reset_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Sliding-window rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    kv: Arc<dyn KvStore>,
}

impl RateLimiter {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        RateLimiter { kv }
    }

    /// Admission check for `identifier` under `limit` requests per
    /// `window_secs`, scoped by `namespace`.
    pub async fn check(
        &self,
        identifier: &str,
        limit: u32,
        window_secs: u64,
        namespace: &str,
    ) -> RateLimitDecision {
        self.check_at(identifier, limit, window_secs, namespace, TimeMs::now().as_ms())
            .await
    }

    /// Per-IP limit: 100 requests / 60 seconds.
    pub async fn check_ip(&self, ip: &str) -> RateLimitDecision {
        self.check(ip, 100, 60, "rl:ip").await
    }

    /// Per-user limit: 200 requests / 60 seconds.
    pub async fn check_user(&self, user_id: i64) -> RateLimitDecision {
        self.check(&user_id.to_string(), 200, 60, "rl:user").await
    }

    /// Per-API-key limit: 1000 requests / 60 seconds.
    pub async fn check_api_key(&self, api_key: &str) -> RateLimitDecision {
        self.check(api_key, 1000, 60, "rl:api").await
    }

    /// Auth endpoint brute-force guard: 5 attempts / 300 seconds.
    pub async fn check_auth(&self, ip: &str) -> RateLimitDecision {
        self.check(ip, 5, 300, "rl:auth").await
    }

    pub(crate) async fn check_at(
        &self,
        identifier: &str,
        limit: u32,
        window_secs: u64,
        namespace: &str,
        now_ms: i64,
    ) -> RateLimitDecision {
        let key = format!("{}:{}", namespace, identifier);
        let window_ms = window_secs as i64 * 1000;
        // Random tie-breaker keeps concurrent same-millisecond requests
        // as distinct set members.
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());
        let reset_at = (now_ms + window_ms) / 1000;

        match self.kv.window_admit(&key, now_ms, window_ms, &member).await {
            Ok(count_before) => {
                let allowed = count_before < limit as u64;
                let remaining = (limit as i64 - count_before as i64 - 1).max(0) as u32;
                RateLimitDecision {
                    allowed,
                    remaining,
                    limit,
                    reset_at,
                    retry_after_seconds: if allowed { None } else { Some(window_secs) },
                }
            }
            Err(err) => {
                warn!(key = %key, "rate limit check failed open: {}", err);
                RateLimitDecision {
                    allowed: true,
                    remaining: limit,
                    limit,
                    reset_at,
                    retry_after_seconds: None,
                }
            }
        }
    }
}
