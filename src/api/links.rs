//! Tracked-link click endpoint: the `no-click -> clicked` transition.
//!
//! Visiting a tracked link records a click and returns the attribution
//! token the caller sets as a browser cookie.

use super::AppState;
use crate::domain::{attribution, CookieId, TimeMs, COOKIE_TTL_DAYS};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickResponse {
    /// Opaque attribution token for the browser cookie.
    pub token: String,
    pub cookie_max_age_days: i64,
}

pub async fn track_click(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ClickResponse>, AppError> {
    let link = state
        .repo
        .get_affiliate_link(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("affiliate link {}", id)))?;

    let cookie_id = CookieId::generate();
    state
        .repo
        .insert_click(link.id, link.affiliate_id, &cookie_id, TimeMs::now())
        .await?;
    state
        .counters
        .increment(&format!("link:clicks:{}", link.id))
        .await;

    Ok(Json(ClickResponse {
        token: attribution::encode(link.id, &cookie_id),
        cookie_max_age_days: COOKIE_TTL_DAYS,
    }))
}
