pub mod affiliates;
pub mod conversions;
pub mod coupons;
pub mod health;
pub mod links;
pub mod rate_limit;
pub mod stores;

use crate::affiliate::ConversionRecorder;
use crate::config::Config;
use crate::db::Repository;
use crate::kv::{CacheStore, CounterStore, RateLimiter};
use axum::middleware;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub recorder: ConversionRecorder,
    pub cache: CacheStore,
    pub counters: CounterStore,
    pub rate_limiter: RateLimiter,
    pub config: Config,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        cache: CacheStore,
        counters: CounterStore,
        rate_limiter: RateLimiter,
        config: Config,
    ) -> Self {
        Self {
            recorder: ConversionRecorder::new(repo.clone()),
            repo,
            cache,
            counters,
            rate_limiter,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/links/:id/click", post(links::track_click))
        .route("/v1/conversions", post(conversions::record))
        .route("/v1/conversions/direct", post(conversions::record_direct))
        .route("/v1/coupons", get(coupons::search))
        .route("/v1/coupons/:id", get(coupons::detail))
        .route("/v1/stores", get(stores::search))
        .route("/v1/affiliates/:id/stats", get(affiliates::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::ip_rate_limit,
        ))
        .layer(cors)
        .with_state(state)
}
