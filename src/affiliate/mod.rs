//! Conversion recorder: attributes purchases to affiliate clicks and
//! applies commission.
//!
//! Per cookie id the lifecycle is `no-click -> clicked -> converted`.
//! Clicks are recorded when a tracked link is visited; this module owns
//! the `clicked -> converted` transition. Every abort path (bad token,
//! already converted, no prior click, missing rows) returns `Ok(None)`:
//! attribution must never fail a purchase flow. Only a relational store
//! failure surfaces as an error.

use crate::db::repo::NewConversion;
use crate::db::Repository;
use crate::domain::{
    attribution, metrics, AffiliateConversion, AffiliateLinkId, CookieId, CouponId, Money, TimeMs,
    UserId,
};
use std::sync::Arc;
use tracing::debug;

/// Days a commission stays pending before it is eligible for approval.
pub const DEFAULT_APPROVAL_PERIOD_DAYS: i64 = 30;

const DAY_MS: i64 = 86_400_000;

/// Records attributed and direct conversions.
#[derive(Clone)]
pub struct ConversionRecorder {
    repo: Arc<Repository>,
}

impl ConversionRecorder {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Record a cookie-attributed conversion.
    ///
    /// Returns `Ok(None)` when the token is malformed, the cookie already
    /// converted, no prior click anchors the attribution, or the affiliate
    /// row is missing.
    ///
    /// # Errors
    /// Returns an error only on relational store failure; the triple
    /// update is transactional, so no partial state is left behind.
    pub async fn record_conversion(
        &self,
        token: &str,
        coupon_id: Option<CouponId>,
        order_value: Option<Money>,
        user_id: Option<UserId>,
    ) -> Result<Option<AffiliateConversion>, sqlx::Error> {
        let Some(decoded) = attribution::decode(token) else {
            debug!("malformed attribution token, skipping conversion");
            return Ok(None);
        };
        let cookie_id = CookieId::new(decoded.cookie_id);

        if self
            .repo
            .find_conversion_by_cookie(&cookie_id)
            .await?
            .is_some()
        {
            debug!(cookie_id = %cookie_id, "cookie already converted, skipping");
            return Ok(None);
        }

        let Some(click) = self
            .repo
            .find_click(decoded.affiliate_link_id, &cookie_id)
            .await?
        else {
            debug!(
                affiliate_link_id = decoded.affiliate_link_id,
                "no originating click, skipping conversion"
            );
            return Ok(None);
        };

        let Some(affiliate) = self.repo.get_affiliate(click.affiliate_id).await? else {
            return Ok(None);
        };

        let rate = affiliate.default_commission_rate;
        let amount = metrics::commission(order_value.unwrap_or_else(Money::zero), rate);

        self.repo
            .record_conversion(&NewConversion {
                affiliate_link_id: click.affiliate_link_id,
                affiliate_id: click.affiliate_id,
                click_id: Some(click.id),
                coupon_id,
                user_id,
                order_value,
                commission_rate: rate,
                commission_amount: amount,
                cookie_id: Some(cookie_id),
                converted_at: TimeMs::now(),
            })
            .await
    }

    /// Record a direct (internal) conversion against a link without a
    /// prior click. No cookie means no idempotency key: callers own
    /// deduplication.
    ///
    /// # Errors
    /// Returns an error only on relational store failure.
    pub async fn record_conversion_direct(
        &self,
        affiliate_link_id: AffiliateLinkId,
        coupon_id: Option<CouponId>,
        order_value: Option<Money>,
        user_id: Option<UserId>,
    ) -> Result<Option<AffiliateConversion>, sqlx::Error> {
        let Some(link) = self.repo.get_affiliate_link(affiliate_link_id).await? else {
            debug!(affiliate_link_id, "unknown affiliate link, skipping conversion");
            return Ok(None);
        };
        let Some(affiliate) = self.repo.get_affiliate(link.affiliate_id).await? else {
            return Ok(None);
        };

        let rate = affiliate.default_commission_rate;
        let amount = metrics::commission(order_value.unwrap_or_else(Money::zero), rate);

        self.repo
            .record_conversion(&NewConversion {
                affiliate_link_id: link.id,
                affiliate_id: link.affiliate_id,
                click_id: None,
                coupon_id,
                user_id,
                order_value,
                commission_rate: rate,
                commission_amount: amount,
                cookie_id: None,
                converted_at: TimeMs::now(),
            })
            .await
    }
}

/// Whether a pending commission is old enough to approve. The actual
/// pending-to-available balance transfer is an external batch process.
pub fn should_approve(converted_at: TimeMs, approval_period_days: i64) -> bool {
    should_approve_at(converted_at, approval_period_days, TimeMs::now())
}

fn should_approve_at(converted_at: TimeMs, approval_period_days: i64, now: TimeMs) -> bool {
    now.as_ms() >= converted_at.as_ms() + approval_period_days * DAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_approve_before_period() {
        let converted = TimeMs::new(0);
        let now = TimeMs::new(29 * DAY_MS);
        assert!(!should_approve_at(converted, 30, now));
    }

    #[test]
    fn test_should_approve_at_boundary() {
        let converted = TimeMs::new(0);
        let now = TimeMs::new(30 * DAY_MS);
        assert!(should_approve_at(converted, 30, now));
    }

    #[test]
    fn test_should_approve_after_period() {
        let converted = TimeMs::new(1_000);
        let now = TimeMs::new(45 * DAY_MS);
        assert!(should_approve_at(converted, 30, now));
    }

    #[test]
    fn test_should_approve_custom_period() {
        let converted = TimeMs::new(0);
        assert!(should_approve_at(converted, 0, TimeMs::new(0)));
        assert!(!should_approve_at(converted, 7, TimeMs::new(6 * DAY_MS)));
    }
}
