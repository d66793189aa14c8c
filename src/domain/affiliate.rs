//! Affiliate program entities: affiliates, links, clicks, conversions.

use crate::domain::{
    AffiliateId, AffiliateLinkId, ClickId, CookieId, CouponId, Money, TimeMs, UserId,
};
use serde::{Deserialize, Serialize};

/// Aggregate earnings holder for one affiliate.
///
/// Balances are mutated additively (increment only) by the conversion
/// recorder; the pending-to-available transfer is an external batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliate {
    pub id: AffiliateId,
    /// Percentage in [0, 100] applied to new conversions.
    pub default_commission_rate: Money,
    pub pending_balance: Money,
    pub total_earnings: Money,
}

/// A trackable referral link issued to an affiliate, optionally bound to
/// a specific coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateLink {
    pub id: AffiliateLinkId,
    pub affiliate_id: AffiliateId,
    pub coupon_id: Option<CouponId>,
    /// Cumulative conversions attributed to this link.
    pub conversion_count: i64,
    /// Cumulative commission earned through this link.
    pub total_earnings: Money,
}

/// One recorded visit through an affiliate link, the attribution anchor
/// for later conversions. Read-only to the conversion recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateClick {
    pub id: ClickId,
    pub affiliate_link_id: AffiliateLinkId,
    pub affiliate_id: AffiliateId,
    pub cookie_id: CookieId,
    pub created_at: TimeMs,
}

/// A purchase event attributed to an affiliate link.
///
/// Created exactly once by the conversion recorder and immutable
/// thereafter. `cookie_id` is absent for direct (internal) conversions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateConversion {
    pub id: i64,
    pub affiliate_link_id: AffiliateLinkId,
    pub affiliate_id: AffiliateId,
    pub click_id: Option<ClickId>,
    pub coupon_id: Option<CouponId>,
    pub user_id: Option<UserId>,
    pub order_value: Option<Money>,
    /// Rate snapshot at conversion time; the affiliate's default rate may
    /// change later without affecting recorded conversions.
    pub commission_rate: Money,
    pub commission_amount: Money,
    pub cookie_id: Option<CookieId>,
    pub pending: bool,
    pub converted_at: TimeMs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_conversion_serializes_camel_case() {
        let conv = AffiliateConversion {
            id: 1,
            affiliate_link_id: 2,
            affiliate_id: 3,
            click_id: Some(4),
            coupon_id: None,
            user_id: None,
            order_value: Some(Money::from_str("100").unwrap()),
            commission_rate: Money::from_str("10").unwrap(),
            commission_amount: Money::from_str("10").unwrap(),
            cookie_id: Some(CookieId::new("c".to_string())),
            pending: true,
            converted_at: TimeMs::new(1_700_000_000_000),
        };
        let json = serde_json::to_value(&conv).unwrap();
        assert_eq!(json["affiliateLinkId"], 2);
        assert_eq!(json["commissionAmount"], 10.0);
        assert_eq!(json["pending"], true);
    }
}
