//! HTTP transport - axum router, shared state, and response envelopes.
//!
//! Handlers here are thin: decode the request, call into [`crate::core`],
//! and render either the resource or an `{ok: false, error}` envelope.
//! No aggregation logic lives at this layer.

pub mod admin;
pub mod campaigns;
pub mod donations;
pub mod payments;

use crate::errors::Error;
use crate::events::DonationFeed;
use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Header operator endpoints expect the shared secret in
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// State shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    /// Database handle
    pub db: DatabaseConnection,
    /// Publishing half of the donation change feed
    pub donation_feed: DonationFeed,
    /// Shared secret for operator endpoints, None leaves them disabled
    pub admin_token: Option<String>,
}

/// Builds the service router with CORS and request tracing layers.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/campaigns", post(campaigns::create_campaign))
        .route("/api/campaigns/:id", get(campaigns::get_campaign))
        .route("/api/donations", post(donations::create_donation))
        .route(
            "/api/donations/:id",
            patch(donations::update_donation).delete(donations::delete_donation),
        )
        .route("/api/payments/confirm", post(payments::confirm_payment))
        .route("/api/admin/recompute", post(admin::recompute))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Plain success envelope: `{"ok": true}`
#[derive(Serialize)]
pub struct OkResponse {
    /// Always true
    pub ok: bool,
}

impl OkResponse {
    pub(crate) const fn new() -> Self {
        Self { ok: true }
    }
}

/// Failure envelope: `{"ok": false, "error": "..."}`
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Always false
    pub ok: bool,
    /// Human-readable failure description
    pub error: String,
}

/// `GET /health` response body.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process can answer at all
    pub status: &'static str,
    /// Crate version baked in at compile time
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Maps a core error onto an HTTP status and the failure envelope.
pub(crate) fn error_response(err: &Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = match err {
        Error::Validation { .. } | Error::InvalidAmount { .. } => StatusCode::BAD_REQUEST,
        Error::CampaignNotFound { .. } | Error::DonationNotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            ok: false,
            error: err.to_string(),
        }),
    )
}

/// Checks the admin token header against the configured secret.
///
/// With no secret configured the operator endpoints refuse every call, so a
/// deployment cannot accidentally expose them unauthenticated.
pub(crate) fn require_admin(
    state: &ApiState,
    headers: &HeaderMap,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let Some(expected) = state.admin_token.as_deref() else {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                ok: false,
                error: "admin endpoints are disabled".to_string(),
            }),
        ));
    };
    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if supplied == Some(expected) {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                ok: false,
                error: "invalid admin token".to_string(),
            }),
        ))
    }
}

/// Test fixture: a fresh state over an in-memory database. The receiving end
/// of the donation feed is returned so tests can drive the worker themselves.
#[cfg(test)]
pub(crate) async fn test_state(
    admin_token: Option<&str>,
) -> crate::errors::Result<(
    ApiState,
    tokio::sync::mpsc::UnboundedReceiver<crate::events::DonationChange>,
)> {
    let db = crate::test_utils::setup_test_db().await?;
    let (donation_feed, receiver) = DonationFeed::channel();
    Ok((
        ApiState {
            db,
            donation_feed,
            admin_token: admin_token.map(ToString::to_string),
        },
        receiver,
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Result;

    #[tokio::test]
    async fn test_error_mapping() -> Result<()> {
        let (status, _) = error_response(&Error::Validation {
            message: "bad".to_string(),
        });
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(&Error::CampaignNotFound {
            id: "x".to_string(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(&Error::Config {
            message: "broken".to_string(),
        });
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_auth_checks() -> Result<()> {
        let (disabled, _rx) = test_state(None).await?;
        let err = require_admin(&disabled, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);

        let (state, _rx) = test_state(Some("sekrit")).await?;
        let err = require_admin(&state, &HeaderMap::new()).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut wrong = HeaderMap::new();
        wrong.insert(ADMIN_TOKEN_HEADER, "guess".parse().unwrap());
        let err = require_admin(&state, &wrong).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut right = HeaderMap::new();
        right.insert(ADMIN_TOKEN_HEADER, "sekrit".parse().unwrap());
        assert!(require_admin(&state, &right).is_ok());

        Ok(())
    }
}
