//! Operator endpoints.

use super::{ApiState, error_response, require_admin};
use crate::core::recompute::{self, CampaignTotals};
use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `POST /api/admin/recompute` response body.
#[derive(Serialize)]
pub struct RecomputeResponse {
    /// Always true on success
    pub ok: bool,
    /// Totals written, keyed by campaign id
    pub results: BTreeMap<String, CampaignTotals>,
}

/// `POST /api/admin/recompute` (admin)
pub async fn recompute(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state, &headers) {
        return denied.into_response();
    }
    match recompute::recompute_all(&state.db).await {
        Ok(results) => Json(RecomputeResponse { ok: true, results }).into_response(),
        Err(err) => error_response(&err).into_response(),
    }
}
