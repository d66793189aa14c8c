//! Store listing endpoint.

use super::AppState;
use crate::domain::Store;
use crate::error::AppError;
use crate::kv::CacheOptions;
use crate::search::{SortBy, StoreFilter};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoresQuery {
    pub query: Option<String>,
    pub country_id: Option<i64>,
    pub city_id: Option<i64>,
    pub district_id: Option<i64>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoresResponse {
    pub stores: Vec<Store>,
}

/// Search approved stores. Cached under the `stores` tag.
pub async fn search(
    Query(params): Query<StoresQuery>,
    State(state): State<AppState>,
) -> Result<Json<StoresResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let filter = StoreFilter {
        query: params.query.clone(),
        country_id: params.country_id,
        city_id: params.city_id,
        district_id: params.district_id,
        sort_by: SortBy::parse(params.sort_by.as_deref()),
    };
    let cache_key = format!(
        "list:q={}:co={}:ci={}:d={}:s={}:l={}",
        params.query.as_deref().unwrap_or(""),
        params.country_id.map(|v| v.to_string()).unwrap_or_default(),
        params.city_id.map(|v| v.to_string()).unwrap_or_default(),
        params.district_id.map(|v| v.to_string()).unwrap_or_default(),
        filter.sort_by.as_str(),
        limit,
    );
    let opts = CacheOptions::default()
        .with_namespace("stores")
        .with_ttl(state.config.cache_ttl_secs)
        .with_tags(vec!["stores".to_string()]);

    let stores = state
        .cache
        .get_or_set(&cache_key, &opts, || async {
            state
                .repo
                .search_stores(&filter, limit)
                .await
                .map_err(AppError::from)
        })
        .await?;

    Ok(Json(StoresResponse { stores }))
}
