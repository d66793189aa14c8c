pub mod affiliate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod kv;
pub mod search;

pub use affiliate::{should_approve, ConversionRecorder, DEFAULT_APPROVAL_PERIOD_DAYS};
pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    Affiliate, AffiliateClick, AffiliateConversion, AffiliateLink, CookieId, Coupon, Money, Store,
    TimeMs,
};
pub use error::AppError;
pub use kv::{CacheStore, CounterStore, KvStore, MemoryKv, RateLimiter, RedisKv};
