//! Domain types for the Kobonz affiliate and catalog core.
//!
//! This module provides:
//! - Lossless monetary arithmetic via the Money wrapper
//! - Domain primitives: TimeMs, CookieId, entity id aliases
//! - Affiliate program entities and the attribution token codec
//! - Commission/CTR arithmetic with zero-denominator guards

pub mod affiliate;
pub mod attribution;
pub mod catalog;
pub mod metrics;
pub mod money;
pub mod primitives;

pub use affiliate::{Affiliate, AffiliateClick, AffiliateConversion, AffiliateLink};
pub use attribution::{AttributionToken, COOKIE_TTL_DAYS};
pub use catalog::{Coupon, CouponStatus, CouponType, Store, StoreStatus};
pub use money::Money;
pub use primitives::{
    AffiliateId, AffiliateLinkId, ClickId, CookieId, CouponId, StoreId, TimeMs, UserId,
};
