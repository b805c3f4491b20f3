//! Campaign entity - Represents a fundraising campaign and its donation aggregates.
//!
//! The aggregate columns (`total_donated`, `donors_count`, `last_donors`) are
//! derived state: they are maintained incrementally by the aggregation worker
//! and payment recorder, and can be rebuilt from scratch by the recompute sweep.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Campaign database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "campaigns")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Slug-style identifier, shared with the public campaign pages
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display title, None for placeholder campaigns created by the recorder
    pub title: Option<String>,
    /// Fundraising goal in major currency units, None when open-ended
    pub goal: Option<f64>,
    /// Lifecycle state of the campaign
    pub status: CampaignStatus,
    /// Running sum of confirmed donation amounts, in major currency units
    pub total_donated: f64,
    /// Running count of confirmed donations, never below zero
    pub donors_count: i32,
    /// Rolling list of recent confirmed donors, most recent first
    pub last_donors: LastDonors,
    /// Instant after which the campaign no longer accepts donations
    pub end_at: Option<DateTimeUtc>,
    /// When the campaign record was created
    pub created_at: DateTimeUtc,
    /// When the campaign record was last written
    pub updated_at: DateTimeUtc,
}

/// Lifecycle states a campaign moves through
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being set up, not yet visible to donors
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Live and accepting donations
    #[sea_orm(string_value = "active")]
    Active,
    /// Temporarily suspended by an operator
    #[sea_orm(string_value = "paused")]
    Paused,
    /// Finished, either manually or via the lifecycle scheduler
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// One entry in a campaign's recent-donor list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DonorEntry {
    /// Display name shown on the campaign page
    pub name: String,
    /// Donated amount in major currency units
    pub amount: f64,
    /// When the donation was counted
    pub at: DateTimeUtc,
}

/// JSON-backed container for the recent-donor list, most recent first
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LastDonors(pub Vec<DonorEntry>);

/// Campaigns reference donations and payments only by id, never through
/// database-level foreign keys, so dangling references stay representable.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
