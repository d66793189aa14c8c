//! Attribution token codec for the affiliate click cookie.
//!
//! The token is URL-safe base64 over a small JSON payload. Decoding is
//! deliberately infallible at the API level: any malformed input means
//! "no attribution available", never an error.

use crate::domain::{AffiliateLinkId, CookieId, TimeMs};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Lifetime of the attribution cookie on the client, in days.
pub const COOKIE_TTL_DAYS: i64 = 30;

/// Decoded attribution cookie payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionToken {
    /// The affiliate link the click went through.
    pub affiliate_link_id: AffiliateLinkId,
    /// Browser-held random correlation id.
    pub cookie_id: String,
    /// When the token was minted, milliseconds since Unix epoch.
    pub timestamp: i64,
}

impl AttributionToken {
    /// Build a token payload stamped with the current time.
    pub fn new(affiliate_link_id: AffiliateLinkId, cookie_id: &CookieId) -> Self {
        AttributionToken {
            affiliate_link_id,
            cookie_id: cookie_id.as_str().to_string(),
            timestamp: TimeMs::now().as_ms(),
        }
    }
}

/// Encode an attribution payload into an opaque cookie-safe string.
pub fn encode(affiliate_link_id: AffiliateLinkId, cookie_id: &CookieId) -> String {
    let token = AttributionToken::new(affiliate_link_id, cookie_id);
    // Serialization of a plain struct cannot fail.
    let json = serde_json::to_vec(&token).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode an attribution token.
///
/// Returns `None` on any malformed input (bad base64, bad JSON, wrong
/// shape). Callers treat `None` as "no attribution available".
pub fn decode(token: &str) -> Option<AttributionToken> {
    let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}
