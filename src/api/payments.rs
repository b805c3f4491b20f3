//! Payment confirmation endpoint.

use super::{ApiState, OkResponse, error_response};
use crate::core::recorder::{self, PaymentConfirmation};
use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// `POST /api/payments/confirm` request body, camelCase per the checkout
/// frontend contract.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    /// Payment processor name; only "stripe" is accepted
    pub provider: String,
    /// Processor-side payment intent id
    pub payment_intent_id: String,
    /// Processor status string, e.g. "succeeded"
    pub status: String,
    /// Campaign id named by the checkout metadata
    pub campaign_id: Option<String>,
    /// Campaign slug, accepted as a fallback reference
    pub campaign_slug: Option<String>,
    /// Paid amount in major currency units
    pub amount: f64,
    /// Paid amount in minor units, when the processor reports it
    pub amount_minor: Option<i64>,
    /// ISO 4217 currency code
    pub currency: String,
    /// Donor name fields from the checkout form
    pub donor: Option<DonorFields>,
}

/// Name fields from the checkout form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorFields {
    /// Donor first name
    pub first_name: Option<String>,
    /// Donor last name
    pub last_name: Option<String>,
}

impl DonorFields {
    /// Joins the name parts into one trimmed display name, None when both
    /// parts are blank.
    fn display_name(&self) -> Option<String> {
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

/// `POST /api/payments/confirm`
pub async fn confirm_payment(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> impl IntoResponse {
    let confirmation = PaymentConfirmation {
        provider: request.provider,
        payment_intent_id: request.payment_intent_id,
        status: request.status,
        campaign_id: request.campaign_id,
        campaign_slug: request.campaign_slug,
        amount: request.amount,
        amount_minor: request.amount_minor,
        currency: request.currency,
        donor_name: request.donor.as_ref().and_then(DonorFields::display_name),
    };

    match recorder::record_payment_confirmation(&state.db, &confirmation).await {
        Ok(()) => Json(OkResponse::new()).into_response(),
        Err(err) => {
            warn!("payment confirmation rejected: {err}");
            error_response(&err).into_response()
        }
    }
}
