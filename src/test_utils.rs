//! Shared test utilities for `CampaignLedger`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::unwrap_used)]

use crate::{
    core::{aggregator::DonationSnapshot, campaigns},
    entities::{CampaignStatus, DonationStatus, campaign, donation},
    errors::Result,
};
use chrono::TimeZone;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Fixed instant used as the test epoch; offsets keep orderings explicit.
#[must_use]
pub fn test_time(offset_secs: i64) -> DateTimeUtc {
    chrono::Utc
        .timestamp_opt(1_700_000_000 + offset_secs, 0)
        .unwrap()
}

/// Creates a test campaign with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `id` - Campaign slug/id
///
/// # Defaults
/// * `title`: "Test Campaign"
/// * `goal`: None (open-ended)
/// * `status`: `Active`
/// * `end_at`: None
pub async fn create_test_campaign(
    db: &DatabaseConnection,
    id: &str,
) -> Result<campaign::Model> {
    campaigns::create_campaign(
        db,
        id.to_string(),
        Some("Test Campaign".to_string()),
        None,
        CampaignStatus::Active,
        None,
    )
    .await
}

/// Creates a test campaign with custom status and end time.
/// Use this for lifecycle scheduler scenarios.
pub async fn create_custom_campaign(
    db: &DatabaseConnection,
    id: &str,
    status: CampaignStatus,
    end_at: Option<DateTimeUtc>,
) -> Result<campaign::Model> {
    campaigns::create_campaign(
        db,
        id.to_string(),
        Some("Test Campaign".to_string()),
        None,
        status,
        end_at,
    )
    .await
}

/// Inserts a donation row directly, bypassing the intake helpers and the
/// change feed. Used by recompute tests that need raw table contents.
///
/// `confirmed_at` is set to `created_at` when the status is `Confirmed`.
pub async fn insert_test_donation(
    db: &DatabaseConnection,
    campaign_id: Option<&str>,
    status: DonationStatus,
    amount: f64,
    donor_name: Option<&str>,
    created_at: DateTimeUtc,
) -> Result<donation::Model> {
    let confirmed_at = (status == DonationStatus::Confirmed).then_some(created_at);
    donation::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        campaign_id: Set(campaign_id.map(ToString::to_string)),
        status: Set(status),
        amount: Set(amount),
        is_anonymous: Set(false),
        donor_name: Set(donor_name.map(ToString::to_string)),
        confirmed_at: Set(confirmed_at),
        created_at: Set(created_at),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// A confirmed donation snapshot with a named donor.
#[must_use]
pub fn confirmed_snapshot(
    campaign_id: &str,
    donor_name: &str,
    amount: f64,
    confirmed_at: DateTimeUtc,
) -> DonationSnapshot {
    DonationSnapshot {
        campaign_id: Some(campaign_id.to_string()),
        status: DonationStatus::Confirmed,
        amount,
        is_anonymous: false,
        donor_name: Some(donor_name.to_string()),
        confirmed_at: Some(confirmed_at),
        created_at: confirmed_at,
    }
}

/// A pending donation snapshot with no donor details yet.
#[must_use]
pub fn pending_snapshot(campaign_id: &str, amount: f64) -> DonationSnapshot {
    DonationSnapshot {
        campaign_id: Some(campaign_id.to_string()),
        status: DonationStatus::Pending,
        amount,
        is_anonymous: false,
        donor_name: None,
        confirmed_at: None,
        created_at: test_time(0),
    }
}
