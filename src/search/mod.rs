//! Filter/sort assembler for coupon and store listing queries.
//!
//! Builds declarative predicates onto a `sqlx::QueryBuilder`; execution
//! stays in the repository. The input field names and the four `sortBy`
//! values are part of the public query-parameter contract.

use crate::domain::{CouponType, Money};
use rust_decimal::prelude::ToPrimitive;
use sqlx::{QueryBuilder, Sqlite};

/// Fixed orderings for listing endpoints.
///
/// Unknown values fall back to `Newest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    Newest,
    /// Usage count (coupons) / coupon count (stores), descending.
    Popular,
    /// Expiry ascending, expiring soonest first.
    EndingSoon,
    HighestDiscount,
}

impl SortBy {
    /// Parse a `sortBy` query value; anything unrecognized is `Newest`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("popular") => SortBy::Popular,
            Some("ending_soon") => SortBy::EndingSoon,
            Some("highest_discount") => SortBy::HighestDiscount,
            _ => SortBy::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::Popular => "popular",
            SortBy::EndingSoon => "ending_soon",
            SortBy::HighestDiscount => "highest_discount",
        }
    }
}

/// Filter input for coupon listing queries.
#[derive(Debug, Clone, Default)]
pub struct CouponFilter {
    /// Case-insensitive substring over title/description/code.
    pub query: Option<String>,
    pub category_id: Option<i64>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub district_id: Option<i64>,
    pub min_discount: Option<Money>,
    pub max_discount: Option<Money>,
    pub coupon_type: Option<CouponType>,
    pub sort_by: SortBy,
}

impl CouponFilter {
    /// Append this filter's predicates to a coupon query whose FROM
    /// clause aliases coupons as `c` and the joined store as `s`.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(query) = normalized(&self.query) {
            let pattern = like_pattern(&query);
            qb.push(" AND (LOWER(c.title) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(c.description) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(c.code) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND c.category_id = ").push_bind(category_id);
        }
        push_location(
            qb,
            self.country_id,
            self.city_id,
            self.district_id,
        );
        if let Some(min) = self.min_discount {
            qb.push(" AND CAST(c.discount_value AS REAL) >= ")
                .push_bind(min.inner().to_f64().unwrap_or(0.0));
        }
        if let Some(max) = self.max_discount {
            qb.push(" AND CAST(c.discount_value AS REAL) <= ")
                .push_bind(max.inner().to_f64().unwrap_or(f64::MAX));
        }
        if let Some(coupon_type) = self.coupon_type {
            qb.push(" AND c.coupon_type = ").push_bind(coupon_type.as_str());
        }
    }

    /// ORDER BY clause for the selected sort.
    pub fn order_sql(&self) -> &'static str {
        match self.sort_by {
            SortBy::Newest => " ORDER BY c.created_at DESC, c.id DESC",
            SortBy::Popular => " ORDER BY c.usage_count DESC, c.id DESC",
            // NULL expiry sorts last: a coupon without an expiry is never
            // "ending soon".
            SortBy::EndingSoon => {
                " ORDER BY c.expires_at IS NULL, c.expires_at ASC, c.id DESC"
            }
            SortBy::HighestDiscount => {
                " ORDER BY CAST(c.discount_value AS REAL) DESC, c.id DESC"
            }
        }
    }
}

/// Filter input for store listing queries.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    /// Case-insensitive substring over name/description.
    pub query: Option<String>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub district_id: Option<i64>,
    pub sort_by: SortBy,
}

impl StoreFilter {
    /// Append this filter's predicates to a store query aliased `s`.
    pub fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if let Some(query) = normalized(&self.query) {
            let pattern = like_pattern(&query);
            qb.push(" AND (LOWER(s.name) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(s.description) LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        push_location(qb, self.country_id, self.city_id, self.district_id);
    }

    /// ORDER BY clause for the selected sort. Discount/expiry orderings
    /// have no meaning for stores and fall back to newest.
    pub fn order_sql(&self) -> &'static str {
        match self.sort_by {
            SortBy::Popular => " ORDER BY s.coupon_count DESC, s.id DESC",
            _ => " ORDER BY s.created_at DESC, s.id DESC",
        }
    }
}

fn push_location(
    qb: &mut QueryBuilder<'_, Sqlite>,
    country_id: Option<i64>,
    city_id: Option<i64>,
    district_id: Option<i64>,
) {
    if let Some(country_id) = country_id {
        qb.push(" AND s.country_id = ").push_bind(country_id);
    }
    if let Some(city_id) = city_id {
        qb.push(" AND s.city_id = ").push_bind(city_id);
    }
    if let Some(district_id) = district_id {
        qb.push(" AND s.district_id = ").push_bind(district_id);
    }
}

fn normalized(query: &Option<String>) -> Option<String> {
    query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn like_pattern(query: &str) -> String {
    format!("%{}%", query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sort_by_parse_contract() {
        assert_eq!(SortBy::parse(Some("newest")), SortBy::Newest);
        assert_eq!(SortBy::parse(Some("popular")), SortBy::Popular);
        assert_eq!(SortBy::parse(Some("ending_soon")), SortBy::EndingSoon);
        assert_eq!(
            SortBy::parse(Some("highest_discount")),
            SortBy::HighestDiscount
        );
        assert_eq!(SortBy::parse(Some("bogus")), SortBy::Newest);
        assert_eq!(SortBy::parse(None), SortBy::Newest);
    }

    #[test]
    fn test_empty_filter_adds_no_predicates() {
        let mut qb = QueryBuilder::new("SELECT 1 WHERE 1=1");
        CouponFilter::default().push_predicates(&mut qb);
        assert_eq!(qb.sql(), "SELECT 1 WHERE 1=1");
    }

    #[test]
    fn test_text_predicate_covers_title_description_code() {
        let filter = CouponFilter {
            query: Some("  Pizza  ".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("");
        filter.push_predicates(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("LOWER(c.title) LIKE"));
        assert!(sql.contains("LOWER(c.description) LIKE"));
        assert!(sql.contains("LOWER(c.code) LIKE"));
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let filter = CouponFilter {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("");
        filter.push_predicates(&mut qb);
        assert_eq!(qb.sql(), "");
    }

    #[test]
    fn test_location_and_discount_predicates() {
        let filter = CouponFilter {
            country_id: Some(1),
            city_id: Some(2),
            district_id: Some(3),
            min_discount: Some(Money::from_str("10").unwrap()),
            max_discount: Some(Money::from_str("50").unwrap()),
            coupon_type: Some(CouponType::Code),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("");
        filter.push_predicates(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("s.country_id ="));
        assert!(sql.contains("s.city_id ="));
        assert!(sql.contains("s.district_id ="));
        assert!(sql.contains("CAST(c.discount_value AS REAL) >="));
        assert!(sql.contains("CAST(c.discount_value AS REAL) <="));
        assert!(sql.contains("c.coupon_type ="));
    }

    #[test]
    fn test_coupon_order_clauses() {
        let mut filter = CouponFilter::default();
        assert!(filter.order_sql().contains("c.created_at DESC"));
        filter.sort_by = SortBy::Popular;
        assert!(filter.order_sql().contains("c.usage_count DESC"));
        filter.sort_by = SortBy::EndingSoon;
        assert!(filter.order_sql().contains("c.expires_at ASC"));
        filter.sort_by = SortBy::HighestDiscount;
        assert!(filter.order_sql().contains("discount_value AS REAL) DESC"));
    }

    #[test]
    fn test_store_order_falls_back_to_newest() {
        let mut filter = StoreFilter::default();
        filter.sort_by = SortBy::HighestDiscount;
        assert!(filter.order_sql().contains("s.created_at DESC"));
        filter.sort_by = SortBy::Popular;
        assert!(filter.order_sql().contains("s.coupon_count DESC"));
    }
}
