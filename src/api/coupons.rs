//! Coupon listing and detail endpoints.

use super::AppState;
use crate::domain::{Coupon, CouponType, Money, TimeMs};
use crate::error::AppError;
use crate::kv::CacheOptions;
use crate::search::{CouponFilter, SortBy};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;
/// Session markers for unique view counting live for 24 hours.
const VIEW_SESSION_TTL_SECS: u64 = 86_400;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponsQuery {
    pub query: Option<String>,
    pub category_id: Option<i64>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub district_id: Option<i64>,
    pub min_discount: Option<f64>,
    pub max_discount: Option<f64>,
    #[serde(rename = "type")]
    pub coupon_type: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponsResponse {
    pub coupons: Vec<Coupon>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDetailResponse {
    pub coupon: Coupon,
    pub views: i64,
}

/// Search active coupons. Responses are read-through cached under the
/// `coupons` tag; a cache outage degrades to direct queries.
pub async fn search(
    Query(params): Query<CouponsQuery>,
    State(state): State<AppState>,
) -> Result<Json<CouponsResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let filter = build_filter(&params);
    let cache_key = list_cache_key(&params, limit);
    let opts = CacheOptions::default()
        .with_namespace("coupons")
        .with_ttl(state.config.cache_ttl_secs)
        .with_tags(vec!["coupons".to_string()]);

    let coupons = state
        .cache
        .get_or_set(&cache_key, &opts, || async {
            state
                .repo
                .search_coupons(&filter, TimeMs::now(), limit)
                .await
                .map_err(AppError::from)
        })
        .await?;

    Ok(Json(CouponsResponse { coupons }))
}

/// Coupon detail. When the caller supplies an `x-session-id` header the
/// view is counted at most once per session per day.
pub async fn detail(
    Path(id): Path<i64>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<CouponDetailResponse>, AppError> {
    let coupon = state
        .repo
        .get_coupon(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("coupon {}", id)))?;

    let views_key = format!("coupon:views:{}", id);
    if let Some(session) = headers.get("x-session-id").and_then(|v| v.to_str().ok()) {
        let marker_key = format!("coupon:{}:{}", id, session);
        if state
            .counters
            .set_session_marker(&marker_key, VIEW_SESSION_TTL_SECS)
            .await
        {
            state.counters.increment(&views_key).await;
        }
    }
    let views = state.counters.get(&views_key).await;

    Ok(Json(CouponDetailResponse { coupon, views }))
}

fn build_filter(params: &CouponsQuery) -> CouponFilter {
    CouponFilter {
        query: params.query.clone(),
        category_id: params.category_id,
        country_id: params.country_id,
        city_id: params.city_id,
        district_id: params.district_id,
        min_discount: params.min_discount.and_then(money_from_f64),
        max_discount: params.max_discount.and_then(money_from_f64),
        // Unknown type values are ignored rather than rejected.
        coupon_type: params
            .coupon_type
            .as_deref()
            .and_then(|t| t.parse::<CouponType>().ok()),
        sort_by: SortBy::parse(params.sort_by.as_deref()),
    }
}

fn money_from_f64(value: f64) -> Option<Money> {
    RustDecimal::from_f64(value).map(Money::new)
}

fn list_cache_key(params: &CouponsQuery, limit: i64) -> String {
    format!(
        "list:q={}:cat={}:co={}:ci={}:d={}:min={}:max={}:t={}:s={}:l={}",
        params.query.as_deref().unwrap_or(""),
        opt(params.category_id),
        opt(params.country_id),
        opt(params.city_id),
        opt(params.district_id),
        params.min_discount.map(|v| v.to_string()).unwrap_or_default(),
        params.max_discount.map(|v| v.to_string()).unwrap_or_default(),
        params.coupon_type.as_deref().unwrap_or(""),
        SortBy::parse(params.sort_by.as_deref()).as_str(),
        limit,
    )
}

fn opt(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
