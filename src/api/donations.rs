//! Donation intake endpoints - public create, admin edit and delete.

use super::{ApiState, OkResponse, error_response, require_admin};
use crate::core::donations::{self, DonationPatch, NewDonation};
use crate::entities::DonationStatus;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// `POST /api/donations` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    /// Donation id, generated when absent
    pub id: Option<String>,
    /// Campaign the donation is attributed to
    pub campaign_id: Option<String>,
    /// Initial settlement state, defaults to pending
    #[serde(default)]
    pub status: DonationStatus,
    /// Donated amount in major currency units
    pub amount: f64,
    /// Whether the donor asked not to be named publicly
    #[serde(default)]
    pub is_anonymous: bool,
    /// Donor display name
    pub donor_name: Option<String>,
    /// Explicit confirmation time
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// `PATCH /api/donations/:id` request body; absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDonationRequest {
    /// Re-attributes the donation to another campaign
    pub campaign_id: Option<String>,
    /// New settlement state
    pub status: Option<DonationStatus>,
    /// New amount in major currency units
    pub amount: Option<f64>,
    /// New anonymity flag
    pub is_anonymous: Option<bool>,
    /// New donor display name
    pub donor_name: Option<String>,
    /// Explicit confirmation time
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// `POST /api/donations`
pub async fn create_donation(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateDonationRequest>,
) -> impl IntoResponse {
    let input = NewDonation {
        id: request.id,
        campaign_id: request.campaign_id,
        status: request.status,
        amount: request.amount,
        is_anonymous: request.is_anonymous,
        donor_name: request.donor_name,
        confirmed_at: request.confirmed_at,
    };
    match donations::create_donation(&state.db, &state.donation_feed, input).await {
        Ok(donation) => (StatusCode::CREATED, Json(donation)).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// `PATCH /api/donations/:id` (admin)
pub async fn update_donation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateDonationRequest>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state, &headers) {
        return denied.into_response();
    }
    let patch = DonationPatch {
        campaign_id: request.campaign_id,
        status: request.status,
        amount: request.amount,
        is_anonymous: request.is_anonymous,
        donor_name: request.donor_name,
        confirmed_at: request.confirmed_at,
    };
    match donations::update_donation(&state.db, &state.donation_feed, &id, patch).await {
        Ok(donation) => Json(donation).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}

/// `DELETE /api/donations/:id` (admin)
pub async fn delete_donation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state, &headers) {
        return denied.into_response();
    }
    match donations::delete_donation(&state.db, &state.donation_feed, &id).await {
        Ok(()) => Json(OkResponse::new()).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
