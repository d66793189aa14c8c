//! Catalog entities: coupons and stores as seen by listing endpoints.

use crate::domain::{CouponId, Money, StoreId, TimeMs};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of offer a coupon represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponType {
    /// Redeemed by entering a code at checkout.
    Code,
    /// A linked deal with no code.
    Deal,
}

impl CouponType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponType::Code => "code",
            CouponType::Deal => "deal",
        }
    }
}

impl FromStr for CouponType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "code" => Ok(CouponType::Code),
            "deal" => Ok(CouponType::Deal),
            _ => Err(()),
        }
    }
}

/// Moderation status of a coupon. Only `Active` coupons are listable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CouponStatus {
    Active,
    Pending,
    Rejected,
    Expired,
}

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponStatus::Active => "ACTIVE",
            CouponStatus::Pending => "PENDING",
            CouponStatus::Rejected => "REJECTED",
            CouponStatus::Expired => "EXPIRED",
        }
    }
}

/// Moderation status of a store. Only `Approved` stores are listable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StoreStatus {
    Approved,
    Pending,
    Rejected,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Approved => "APPROVED",
            StoreStatus::Pending => "PENDING",
            StoreStatus::Rejected => "REJECTED",
        }
    }
}

/// A published coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    pub store_id: StoreId,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub coupon_type: CouponType,
    /// Discount as a percentage of order value.
    pub discount_value: Money,
    pub status: CouponStatus,
    pub usage_count: i64,
    pub expires_at: Option<TimeMs>,
    pub created_at: TimeMs,
}

/// A merchant storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub description: Option<String>,
    pub status: StoreStatus,
    pub active: bool,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub district_id: Option<i64>,
    pub coupon_count: i64,
    pub created_at: TimeMs,
}
