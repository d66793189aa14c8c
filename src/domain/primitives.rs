//! Domain primitives: TimeMs, CookieId, entity id aliases.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier` (saturating at 0).
    pub fn since(&self, earlier: TimeMs) -> i64 {
        (self.0 - earlier.0).max(0)
    }
}

/// Client-held random identifier correlating a click to a later conversion.
///
/// Independent of any session or auth identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CookieId(pub String);

impl CookieId {
    /// Wrap an existing cookie id string.
    pub fn new(id: String) -> Self {
        CookieId(id)
    }

    /// Generate a fresh random cookie id.
    pub fn generate() -> Self {
        CookieId(Uuid::new_v4().to_string())
    }

    /// Get the cookie id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CookieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row id of an affiliate.
pub type AffiliateId = i64;
/// Row id of an affiliate link.
pub type AffiliateLinkId = i64;
/// Row id of a click record.
pub type ClickId = i64;
/// Row id of a coupon.
pub type CouponId = i64;
/// Row id of a store.
pub type StoreId = i64;
/// Row id of a shopper account.
pub type UserId = i64;
