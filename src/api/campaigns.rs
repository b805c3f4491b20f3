//! Campaign endpoints - public read, admin create.

use super::{ApiState, error_response, require_admin};
use crate::core::campaigns;
use crate::entities::CampaignStatus;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// `POST /api/campaigns` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    /// Slug-style campaign id
    pub id: String,
    /// Display title
    pub title: Option<String>,
    /// Fundraising goal in major currency units
    pub goal: Option<f64>,
    /// Initial lifecycle state, defaults to draft
    #[serde(default)]
    pub status: CampaignStatus,
    /// Instant after which the lifecycle scheduler closes the campaign
    pub end_at: Option<DateTime<Utc>>,
}

/// `GET /api/campaigns/:id`
pub async fn get_campaign(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match campaigns::get_campaign(&state.db, &id).await {
        Ok(campaign) => Json(campaign).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// `POST /api/campaigns` (admin)
pub async fn create_campaign(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Json(request): Json<CreateCampaignRequest>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state, &headers) {
        return denied.into_response();
    }
    match campaigns::create_campaign(
        &state.db,
        request.id,
        request.title,
        request.goal,
        request.status,
        request.end_at,
    )
    .await
    {
        Ok(campaign) => (StatusCode::CREATED, Json(campaign)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
