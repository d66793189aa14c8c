//! Conversion tracking endpoints, consumed by internal purchase flows.
//!
//! A purchase must never fail because attribution failed: every
//! attribution miss (bad token, no click, already converted) answers 200
//! with a null conversion.

use super::AppState;
use crate::domain::{AffiliateConversion, Money};
use crate::error::AppError;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRequest {
    pub token: String,
    pub coupon_id: Option<i64>,
    pub order_value: Option<Money>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDirectRequest {
    pub affiliate_link_id: i64,
    pub coupon_id: Option<i64>,
    pub order_value: Option<Money>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub conversion: Option<AffiliateConversion>,
}

/// Record a cookie-attributed conversion.
pub async fn record(
    State(state): State<AppState>,
    Json(req): Json<RecordRequest>,
) -> Result<Json<ConversionResponse>, AppError> {
    validate_order_value(req.order_value)?;

    let conversion = state
        .recorder
        .record_conversion(&req.token, req.coupon_id, req.order_value, req.user_id)
        .await?;

    Ok(Json(ConversionResponse { conversion }))
}

/// Record a direct (internal) conversion against a link id.
pub async fn record_direct(
    State(state): State<AppState>,
    Json(req): Json<RecordDirectRequest>,
) -> Result<Json<ConversionResponse>, AppError> {
    validate_order_value(req.order_value)?;

    let conversion = state
        .recorder
        .record_conversion_direct(
            req.affiliate_link_id,
            req.coupon_id,
            req.order_value,
            req.user_id,
        )
        .await?;

    Ok(Json(ConversionResponse { conversion }))
}

fn validate_order_value(order_value: Option<Money>) -> Result<(), AppError> {
    if order_value.map(|v| v.is_negative()).unwrap_or(false) {
        return Err(AppError::BadRequest("orderValue must be >= 0".into()));
    }
    Ok(())
}
