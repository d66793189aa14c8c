//! Affiliate performance reporting.

use super::AppState;
use crate::domain::{metrics, Money};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateStatsResponse {
    pub affiliate_id: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// Conversions over clicks, percent.
    pub ctr: Money,
    pub default_commission_rate: Money,
    pub pending_balance: Money,
    pub total_earnings: Money,
}

pub async fn stats(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<AffiliateStatsResponse>, AppError> {
    let affiliate = state
        .repo
        .get_affiliate(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("affiliate {}", id)))?;

    let clicks = state.repo.count_clicks(id).await?;
    let conversions = state.repo.count_conversions(id).await?;

    Ok(Json(AffiliateStatsResponse {
        affiliate_id: id,
        clicks,
        conversions,
        ctr: metrics::ctr(clicks, conversions),
        default_commission_rate: affiliate.default_commission_rate,
        pending_balance: affiliate.pending_balance,
        total_earnings: affiliate.total_earnings,
    }))
}
