//! Coupon and store listing repository operations.
//!
//! Listing queries take their predicates from the search assembler; only
//! eligibility (ACTIVE/non-expired coupons, APPROVED/active stores) is
//! decided here.

use super::{parse_money, Repository};
use crate::domain::{
    Coupon, CouponId, CouponStatus, CouponType, Store, StoreId, StoreStatus, TimeMs,
};
use crate::search::{CouponFilter, StoreFilter};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row};
use tracing::warn;

const COUPON_COLUMNS: &str = "c.id, c.store_id, c.category_id, c.title, c.description, c.code, \
     c.coupon_type, c.discount_value, c.status, c.usage_count, c.expires_at, c.created_at";

const STORE_COLUMNS: &str = "s.id, s.name, s.description, s.status, s.active, s.country_id, \
     s.city_id, s.district_id, s.coupon_count, s.created_at";

impl Repository {
    // =========================================================================
    // Store operations
    // =========================================================================

    /// Insert a store, returning its new id. The `id` field of the input
    /// is ignored.
    pub async fn insert_store(&self, store: &Store) -> Result<StoreId, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO stores
                (name, description, status, active, country_id, city_id, district_id,
                 coupon_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&store.name)
        .bind(&store.description)
        .bind(store.status.as_str())
        .bind(store.active)
        .bind(store.country_id)
        .bind(store.city_id)
        .bind(store.district_id)
        .bind(store.coupon_count)
        .bind(store.created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Search approved, active stores with the given filter.
    pub async fn search_stores(
        &self,
        filter: &StoreFilter,
        limit: i64,
    ) -> Result<Vec<Store>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM stores s WHERE s.status = 'APPROVED' AND s.active = 1",
            STORE_COLUMNS
        ));
        filter.push_predicates(&mut qb);
        qb.push(filter.order_sql());
        qb.push(" LIMIT ").push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(map_store).collect())
    }

    // =========================================================================
    // Coupon operations
    // =========================================================================

    /// Insert a coupon, returning its new id. The `id` field of the input
    /// is ignored.
    pub async fn insert_coupon(&self, coupon: &Coupon) -> Result<CouponId, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO coupons
                (store_id, category_id, title, description, code, coupon_type,
                 discount_value, status, usage_count, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(coupon.store_id)
        .bind(coupon.category_id)
        .bind(&coupon.title)
        .bind(&coupon.description)
        .bind(&coupon.code)
        .bind(coupon.coupon_type.as_str())
        .bind(coupon.discount_value.to_canonical_string())
        .bind(coupon.status.as_str())
        .bind(coupon.usage_count)
        .bind(coupon.expires_at.map(|t| t.as_ms()))
        .bind(coupon.created_at.as_ms())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a coupon by id regardless of status.
    pub async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM coupons c WHERE c.id = ",
            COUPON_COLUMNS
        ));
        qb.push_bind(id);
        let row = qb.build().fetch_optional(&self.pool).await?;
        Ok(row.map(map_coupon))
    }

    /// Search active, non-expired coupons in approved stores with the
    /// given filter, as of `now`.
    pub async fn search_coupons(
        &self,
        filter: &CouponFilter,
        now: TimeMs,
        limit: i64,
    ) -> Result<Vec<Coupon>, sqlx::Error> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM coupons c JOIN stores s ON s.id = c.store_id \
             WHERE c.status = 'ACTIVE' AND (c.expires_at IS NULL OR c.expires_at > ",
            COUPON_COLUMNS
        ));
        qb.push_bind(now.as_ms());
        qb.push(") AND s.status = 'APPROVED' AND s.active = 1");
        filter.push_predicates(&mut qb);
        qb.push(filter.order_sql());
        qb.push(" LIMIT ").push_bind(limit);

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(map_coupon).collect())
    }
}

fn map_coupon(row: SqliteRow) -> Coupon {
    Coupon {
        id: row.get("id"),
        store_id: row.get("store_id"),
        category_id: row.get("category_id"),
        title: row.get("title"),
        description: row.get("description"),
        code: row.get("code"),
        coupon_type: parse_coupon_type(&row.get::<String, _>("coupon_type")),
        discount_value: parse_money(&row.get::<String, _>("discount_value"), "discount_value"),
        status: parse_coupon_status(&row.get::<String, _>("status")),
        usage_count: row.get("usage_count"),
        expires_at: row.get::<Option<i64>, _>("expires_at").map(TimeMs::new),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

fn map_store(row: SqliteRow) -> Store {
    Store {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        status: parse_store_status(&row.get::<String, _>("status")),
        active: row.get::<i64, _>("active") != 0,
        country_id: row.get("country_id"),
        city_id: row.get("city_id"),
        district_id: row.get("district_id"),
        coupon_count: row.get("coupon_count"),
        created_at: TimeMs::new(row.get("created_at")),
    }
}

fn parse_coupon_type(raw: &str) -> CouponType {
    raw.parse().unwrap_or_else(|_| {
        warn!(value = %raw, "unknown coupon_type, substituting code");
        CouponType::Code
    })
}

fn parse_coupon_status(raw: &str) -> CouponStatus {
    match raw {
        "ACTIVE" => CouponStatus::Active,
        "PENDING" => CouponStatus::Pending,
        "REJECTED" => CouponStatus::Rejected,
        "EXPIRED" => CouponStatus::Expired,
        other => {
            warn!(value = %other, "unknown coupon status, substituting PENDING");
            CouponStatus::Pending
        }
    }
}

fn parse_store_status(raw: &str) -> StoreStatus {
    match raw {
        "APPROVED" => StoreStatus::Approved,
        "PENDING" => StoreStatus::Pending,
        "REJECTED" => StoreStatus::Rejected,
        other => {
            warn!(value = %other, "unknown store status, substituting PENDING");
            StoreStatus::Pending
        }
    }
}
