//! IP rate-limit middleware.
//!
//! Applies the sliding-window limiter to every request, keyed by client
//! IP. Denials are answered with 429 and a Retry-After header; the
//! limiter itself fails open, so an unreachable store never blocks
//! traffic.

use super::AppState;
use crate::kv::RateLimitDecision;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn ip_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    let decision = state.rate_limiter.check_ip(&ip).await;

    if !decision.allowed {
        return too_many_requests(&decision);
    }

    let mut response = next.run(req).await;
    apply_headers(&mut response, &decision);
    response
}

fn client_ip(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

fn too_many_requests(decision: &RateLimitDecision) -> Response {
    let body = Json(serde_json::json!({
        "error": "too many requests",
        "retryAfterSeconds": decision.retry_after_seconds,
    }));
    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    if let Some(retry_after) = decision.retry_after_seconds {
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("retry-after", value);
        }
    }
    apply_headers(&mut response, decision);
    response
}

fn apply_headers(response: &mut Response, decision: &RateLimitDecision) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&decision.limit.to_string()) {
        headers.insert("x-ratelimit-limit", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", value);
    }
}
