use axum::http::StatusCode;
use kobonz::api;
use kobonz::config::Config;
use kobonz::db::init_db;
use kobonz::kv::{CacheStore, CounterStore, KvStore, MemoryKv, RateLimiter};
use kobonz::Repository;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const IP_LIMIT: usize = 100;

struct TestApp {
    app: axum::Router,
    _temp: TempDir,
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    let config = Config {
        port: 0,
        database_path: db_path,
        redis_url: "redis://unused.invalid/".to_string(),
        cache_ttl_secs: 60,
        approval_period_days: 30,
    };

    let state = api::AppState::new(
        repo,
        CacheStore::new(kv.clone()),
        CounterStore::new(kv.clone()),
        RateLimiter::new(kv),
        config,
    );
    TestApp {
        app: api::create_router(state),
        _temp: temp_dir,
    }
}

async fn get_as(app: axum::Router, uri: &str, ip: &str) -> axum::response::Response {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-forwarded-for", ip)
        .body(axum::body::Body::empty())
        .unwrap();
    app.oneshot(req).await.unwrap()
}

fn header_num(resp: &axum::response::Response, name: &str) -> i64 {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| panic!("missing header {}", name))
}

#[tokio::test]
async fn test_requests_within_limit_pass_with_headers() {
    let t = setup_test_app().await;

    let first = get_as(t.app.clone(), "/health", "10.0.0.1").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header_num(&first, "x-ratelimit-limit"), IP_LIMIT as i64);
    assert_eq!(header_num(&first, "x-ratelimit-remaining"), 99);

    let second = get_as(t.app.clone(), "/health", "10.0.0.1").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(header_num(&second, "x-ratelimit-remaining"), 98);
}

#[tokio::test]
async fn test_limit_exceeded_answers_429() {
    let t = setup_test_app().await;

    for _ in 0..IP_LIMIT {
        let resp = get_as(t.app.clone(), "/health", "10.0.0.2").await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let denied = get_as(t.app.clone(), "/health", "10.0.0.2").await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(header_num(&denied, "retry-after"), 60);
    assert_eq!(header_num(&denied, "x-ratelimit-remaining"), 0);

    let bytes = axum::body::to_bytes(denied.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "too many requests");
    assert_eq!(body["retryAfterSeconds"], 60);
}

#[tokio::test]
async fn test_limit_is_per_client_ip() {
    let t = setup_test_app().await;

    for _ in 0..=IP_LIMIT {
        get_as(t.app.clone(), "/health", "10.0.0.3").await;
    }
    let denied = get_as(t.app.clone(), "/health", "10.0.0.3").await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);

    let other = get_as(t.app.clone(), "/health", "10.0.0.4").await;
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_chain_uses_first_hop() {
    let t = setup_test_app().await;

    for _ in 0..IP_LIMIT {
        get_as(t.app.clone(), "/health", "10.0.0.5, 192.168.1.1").await;
    }
    // Same originating client behind a different proxy is still limited.
    let denied = get_as(t.app.clone(), "/health", "10.0.0.5, 192.168.9.9").await;
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
}
