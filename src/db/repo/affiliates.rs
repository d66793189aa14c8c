//! Affiliate, link, click, and conversion repository operations.

use super::{parse_money, Repository};
use crate::domain::{
    Affiliate, AffiliateClick, AffiliateConversion, AffiliateId, AffiliateLink, AffiliateLinkId,
    ClickId, CookieId, CouponId, Money, TimeMs, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Input for the transactional conversion insert.
#[derive(Debug, Clone)]
pub struct NewConversion {
    pub affiliate_link_id: AffiliateLinkId,
    pub affiliate_id: AffiliateId,
    pub click_id: Option<ClickId>,
    pub coupon_id: Option<CouponId>,
    pub user_id: Option<UserId>,
    pub order_value: Option<Money>,
    pub commission_rate: Money,
    pub commission_amount: Money,
    pub cookie_id: Option<CookieId>,
    pub converted_at: TimeMs,
}

impl Repository {
    // =========================================================================
    // Affiliate operations
    // =========================================================================

    /// Create an affiliate with the given default commission rate.
    pub async fn insert_affiliate(&self, default_rate: Money) -> Result<Affiliate, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO affiliates (default_commission_rate, pending_balance, total_earnings)
            VALUES (?, '0', '0')
            "#,
        )
        .bind(default_rate.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(Affiliate {
            id: result.last_insert_rowid(),
            default_commission_rate: default_rate,
            pending_balance: Money::zero(),
            total_earnings: Money::zero(),
        })
    }

    /// Fetch an affiliate by id.
    pub async fn get_affiliate(&self, id: AffiliateId) -> Result<Option<Affiliate>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, default_commission_rate, pending_balance, total_earnings
            FROM affiliates WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_affiliate))
    }

    // =========================================================================
    // Link operations
    // =========================================================================

    /// Create an affiliate link, optionally bound to a coupon.
    pub async fn insert_affiliate_link(
        &self,
        affiliate_id: AffiliateId,
        coupon_id: Option<CouponId>,
    ) -> Result<AffiliateLink, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO affiliate_links (affiliate_id, coupon_id, conversion_count, total_earnings)
            VALUES (?, ?, 0, '0')
            "#,
        )
        .bind(affiliate_id)
        .bind(coupon_id)
        .execute(&self.pool)
        .await?;

        Ok(AffiliateLink {
            id: result.last_insert_rowid(),
            affiliate_id,
            coupon_id,
            conversion_count: 0,
            total_earnings: Money::zero(),
        })
    }

    /// Fetch an affiliate link by id.
    pub async fn get_affiliate_link(
        &self,
        id: AffiliateLinkId,
    ) -> Result<Option<AffiliateLink>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, affiliate_id, coupon_id, conversion_count, total_earnings
            FROM affiliate_links WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_link))
    }

    // =========================================================================
    // Click operations
    // =========================================================================

    /// Record a click-through on an affiliate link.
    pub async fn insert_click(
        &self,
        affiliate_link_id: AffiliateLinkId,
        affiliate_id: AffiliateId,
        cookie_id: &CookieId,
        created_at: TimeMs,
    ) -> Result<AffiliateClick, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO affiliate_clicks (affiliate_link_id, affiliate_id, cookie_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(affiliate_link_id)
        .bind(affiliate_id)
        .bind(cookie_id.as_str())
        .bind(created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(AffiliateClick {
            id: result.last_insert_rowid(),
            affiliate_link_id,
            affiliate_id,
            cookie_id: cookie_id.clone(),
            created_at,
        })
    }

    /// Find the most recent click for (link, cookie) — the attribution
    /// anchor for a conversion.
    pub async fn find_click(
        &self,
        affiliate_link_id: AffiliateLinkId,
        cookie_id: &CookieId,
    ) -> Result<Option<AffiliateClick>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, affiliate_link_id, affiliate_id, cookie_id, created_at
            FROM affiliate_clicks
            WHERE affiliate_link_id = ? AND cookie_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(affiliate_link_id)
        .bind(cookie_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_click))
    }

    /// Total clicks recorded for an affiliate.
    pub async fn count_clicks(&self, affiliate_id: AffiliateId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM affiliate_clicks WHERE affiliate_id = ?")
                .bind(affiliate_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // =========================================================================
    // Conversion operations
    // =========================================================================

    /// Find an existing conversion by cookie id (idempotency fast path).
    pub async fn find_conversion_by_cookie(
        &self,
        cookie_id: &CookieId,
    ) -> Result<Option<AffiliateConversion>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, affiliate_link_id, affiliate_id, click_id, coupon_id, user_id,
                   order_value, commission_rate, commission_amount, cookie_id, pending,
                   converted_at
            FROM affiliate_conversions WHERE cookie_id = ?
            "#,
        )
        .bind(cookie_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_conversion))
    }

    /// Total conversions recorded for an affiliate.
    pub async fn count_conversions(&self, affiliate_id: AffiliateId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM affiliate_conversions WHERE affiliate_id = ?")
                .bind(affiliate_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Create a conversion and apply the aggregate increments as one
    /// transaction: the conversion row (pending), the link's conversion
    /// count and earnings, and the affiliate's pending balance and total
    /// earnings. No partial application is observable.
    ///
    /// Returns `None` without side effects when the cookie already has a
    /// conversion (unique index, losing racer) or when the link or
    /// affiliate row is missing.
    ///
    /// # Errors
    /// Returns an error if the transaction fails; nothing is persisted.
    pub async fn record_conversion(
        &self,
        new: &NewConversion,
    ) -> Result<Option<AffiliateConversion>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO affiliate_conversions
                (affiliate_link_id, affiliate_id, click_id, coupon_id, user_id,
                 order_value, commission_rate, commission_amount, cookie_id, pending,
                 converted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(new.affiliate_link_id)
        .bind(new.affiliate_id)
        .bind(new.click_id)
        .bind(new.coupon_id)
        .bind(new.user_id)
        .bind(new.order_value.map(|v| v.to_canonical_string()))
        .bind(new.commission_rate.to_canonical_string())
        .bind(new.commission_amount.to_canonical_string())
        .bind(new.cookie_id.as_ref().map(|c| c.as_str().to_string()))
        .bind(new.converted_at.as_ms())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Lost the uniqueness race on cookie_id.
            tx.rollback().await?;
            return Ok(None);
        }
        let conversion_id = result.last_insert_rowid();

        let link_row = sqlx::query(
            "SELECT conversion_count, total_earnings FROM affiliate_links WHERE id = ?",
        )
        .bind(new.affiliate_link_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(link_row) = link_row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let link_earnings =
            parse_money(&link_row.get::<String, _>("total_earnings"), "total_earnings")
                + new.commission_amount;
        sqlx::query(
            "UPDATE affiliate_links SET conversion_count = conversion_count + 1, total_earnings = ? WHERE id = ?",
        )
        .bind(link_earnings.to_canonical_string())
        .bind(new.affiliate_link_id)
        .execute(&mut *tx)
        .await?;

        let affiliate_row = sqlx::query(
            "SELECT pending_balance, total_earnings FROM affiliates WHERE id = ?",
        )
        .bind(new.affiliate_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(affiliate_row) = affiliate_row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let pending =
            parse_money(&affiliate_row.get::<String, _>("pending_balance"), "pending_balance")
                + new.commission_amount;
        let earnings =
            parse_money(&affiliate_row.get::<String, _>("total_earnings"), "total_earnings")
                + new.commission_amount;
        sqlx::query("UPDATE affiliates SET pending_balance = ?, total_earnings = ? WHERE id = ?")
            .bind(pending.to_canonical_string())
            .bind(earnings.to_canonical_string())
            .bind(new.affiliate_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(AffiliateConversion {
            id: conversion_id,
            affiliate_link_id: new.affiliate_link_id,
            affiliate_id: new.affiliate_id,
            click_id: new.click_id,
            coupon_id: new.coupon_id,
            user_id: new.user_id,
            order_value: new.order_value,
            commission_rate: new.commission_rate,
            commission_amount: new.commission_amount,
            cookie_id: new.cookie_id.clone(),
            pending: true,
            converted_at: new.converted_at,
        }))
    }
}

fn map_affiliate(row: SqliteRow) -> Affiliate {
    Affiliate {
        id: row.get("id"),
        default_commission_rate: parse_money(
            &row.get::<String, _>("default_commission_rate"),
            "default_commission_rate",
        ),
        pending_balance: parse_money(
            &row.get::<String, _>("pending_balance"),
            "pending_balance",
        ),
        total_earnings: parse_money(&row.get::<String, _>("total_earnings"), "total_earnings"),
    }
}

fn map_link(row: SqliteRow) -> AffiliateLink {
    AffiliateLink {
        id: row.get("id"),
        affiliate_id: row.get("affiliate_id"),
        coupon_id: row.get("coupon_id"),
        conversion_count: row.get("conversion_count"),
        total_earnings: parse_money(&row.get::<String, _>("total_earnings"), "total_earnings"),
    }
}

fn map_click(row: SqliteRow) -> AffiliateClick {
    AffiliateClick {
        id: row.get("id"),
        affiliate_link_id: row.get("affiliate_link_id"),
        affiliate_id: row.get("affiliate_id"),
        cookie_id: CookieId::new(row.get("cookie_id")),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

fn map_conversion(row: SqliteRow) -> AffiliateConversion {
    AffiliateConversion {
        id: row.get("id"),
        affiliate_link_id: row.get("affiliate_link_id"),
        affiliate_id: row.get("affiliate_id"),
        click_id: row.get("click_id"),
        coupon_id: row.get("coupon_id"),
        user_id: row.get("user_id"),
        order_value: row
            .get::<Option<String>, _>("order_value")
            .map(|v| parse_money(&v, "order_value")),
        commission_rate: parse_money(
            &row.get::<String, _>("commission_rate"),
            "commission_rate",
        ),
        commission_amount: parse_money(
            &row.get::<String, _>("commission_amount"),
            "commission_amount",
        ),
        cookie_id: row.get::<Option<String>, _>("cookie_id").map(CookieId::new),
        pending: row.get::<i64, _>("pending") != 0,
        converted_at: TimeMs::new(row.get("converted_at")),
    }
}
