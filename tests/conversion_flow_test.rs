use axum::http::StatusCode;
use kobonz::api;
use kobonz::config::Config;
use kobonz::db::init_db;
use kobonz::domain::{attribution, CookieId, Money, TimeMs};
use kobonz::kv::{CacheStore, CounterStore, KvStore, MemoryKv, RateLimiter};
use kobonz::{ConversionRecorder, Repository};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
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
        repo.clone(),
        CacheStore::new(kv.clone()),
        CounterStore::new(kv.clone()),
        RateLimiter::new(kv),
        config,
    );
    let app = api::create_router(state);

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(
    app: axum::Router,
    req: axum::http::Request<axum::body::Body>,
) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_click_then_purchase_scenario() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("10").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();

    // Visit the tracked link.
    let (status, body) = post_json(
        t.app.clone(),
        &format!("/v1/links/{}/click", link.id),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("token missing").to_string();
    assert_eq!(body["cookieMaxAgeDays"], 30);

    // Purchase with the attribution cookie.
    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": token, "orderValue": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversion = &body["conversion"];
    assert!(!conversion.is_null());
    assert_eq!(conversion["commissionAmount"], 10.0);
    assert_eq!(conversion["commissionRate"], 10.0);
    assert_eq!(conversion["pending"], true);
    assert_eq!(conversion["affiliateLinkId"], link.id);

    let affiliate = t.repo.get_affiliate(affiliate.id).await.unwrap().unwrap();
    assert_eq!(affiliate.pending_balance, Money::from_str("10").unwrap());
    assert_eq!(affiliate.total_earnings, Money::from_str("10").unwrap());

    let link = t.repo.get_affiliate_link(link.id).await.unwrap().unwrap();
    assert_eq!(link.conversion_count, 1);
    assert_eq!(link.total_earnings, Money::from_str("10").unwrap());

    // Second purchase with the same token is an idempotent no-op.
    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": token, "orderValue": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conversion"].is_null());

    let affiliate = t.repo.get_affiliate(affiliate.id).await.unwrap().unwrap();
    assert_eq!(affiliate.pending_balance, Money::from_str("10").unwrap());
    let link = t.repo.get_affiliate_link(link.id).await.unwrap().unwrap();
    assert_eq!(link.conversion_count, 1);
}

#[tokio::test]
async fn test_malformed_token_returns_null_not_error() {
    let t = setup_test_app().await;
    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": "not json", "orderValue": 50}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conversion"].is_null());
}

#[tokio::test]
async fn test_conversion_without_prior_click_returns_null() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("10").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();

    // Token minted without any recorded click.
    let token = attribution::encode(link.id, &CookieId::generate());
    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": token, "orderValue": 100}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conversion"].is_null());

    let affiliate = t.repo.get_affiliate(affiliate.id).await.unwrap().unwrap();
    assert!(affiliate.pending_balance.is_zero());
}

#[tokio::test]
async fn test_negative_order_value_rejected() {
    let t = setup_test_app().await;
    let (status, _body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": "anything", "orderValue": -1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_direct_conversion_without_cookie() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("7.5").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();

    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions/direct",
        serde_json::json!({"affiliateLinkId": link.id, "orderValue": 200}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversion = &body["conversion"];
    assert_eq!(conversion["commissionAmount"], 15.0);
    assert!(conversion["cookieId"].is_null());
    assert!(conversion["clickId"].is_null());

    let affiliate = t.repo.get_affiliate(affiliate.id).await.unwrap().unwrap();
    assert_eq!(affiliate.pending_balance, Money::from_str("15").unwrap());
}

#[tokio::test]
async fn test_direct_conversion_unknown_link_returns_null() {
    let t = setup_test_app().await;
    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions/direct",
        serde_json::json!({"affiliateLinkId": 99999}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["conversion"].is_null());
}

#[tokio::test]
async fn test_conversion_without_order_value_has_zero_commission() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("10").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();

    let (_, body) = post_json(
        t.app.clone(),
        &format!("/v1/links/{}/click", link.id),
        serde_json::json!({}),
    )
    .await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": token}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversion = &body["conversion"];
    assert!(!conversion.is_null());
    assert_eq!(conversion["commissionAmount"], 0.0);
    assert!(conversion["orderValue"].is_null());
}

#[tokio::test]
async fn test_recorder_idempotent_at_library_level() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("10").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();
    let cookie = CookieId::generate();
    t.repo
        .insert_click(link.id, affiliate.id, &cookie, TimeMs::now())
        .await
        .unwrap();

    let recorder = ConversionRecorder::new(t.repo.clone());
    let token = attribution::encode(link.id, &cookie);

    let first = recorder
        .record_conversion(&token, None, Some(Money::from_str("100").unwrap()), None)
        .await
        .unwrap();
    assert!(first.is_some());
    assert_eq!(
        first.unwrap().commission_amount,
        Money::from_str("10").unwrap()
    );

    let second = recorder
        .record_conversion(&token, None, Some(Money::from_str("100").unwrap()), None)
        .await
        .unwrap();
    assert!(second.is_none());

    let count = t.repo.count_conversions(affiliate.id).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_affiliate_stats_endpoint() {
    let t = setup_test_app().await;
    let affiliate = t
        .repo
        .insert_affiliate(Money::from_str("10").unwrap())
        .await
        .unwrap();
    let link = t
        .repo
        .insert_affiliate_link(affiliate.id, None)
        .await
        .unwrap();

    // Two clicks, one conversion.
    let (_, body) = post_json(
        t.app.clone(),
        &format!("/v1/links/{}/click", link.id),
        serde_json::json!({}),
    )
    .await;
    let token = body["token"].as_str().unwrap().to_string();
    post_json(
        t.app.clone(),
        &format!("/v1/links/{}/click", link.id),
        serde_json::json!({}),
    )
    .await;
    post_json(
        t.app.clone(),
        "/v1/conversions",
        serde_json::json!({"token": token, "orderValue": 100}),
    )
    .await;

    let (status, body) = get(
        t.app.clone(),
        &format!("/v1/affiliates/{}/stats", affiliate.id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clicks"], 2);
    assert_eq!(body["conversions"], 1);
    assert_eq!(body["ctr"], 50.0);
    assert_eq!(body["pendingBalance"], 10.0);
}

#[tokio::test]
async fn test_stats_unknown_affiliate_is_404() {
    let t = setup_test_app().await;
    let (status, _) = get(t.app.clone(), "/v1/affiliates/424242/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
