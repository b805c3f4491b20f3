//! Donation entity - Represents a single donation record.
//!
//! Donations are the source of truth for campaign aggregates: only rows in
//! `confirmed` status count toward a campaign's totals. Writes to this table
//! are announced on the donation change feed so the aggregation worker can
//! fold them into the owning campaign.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Donation database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "donations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Donation identifier, a UUID unless supplied by the intake flow
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Id of the campaign this donation belongs to, None for unattributed gifts
    pub campaign_id: Option<String>,
    /// Settlement state of the donation
    pub status: DonationStatus,
    /// Donated amount in major currency units
    pub amount: f64,
    /// Whether the donor asked not to be named publicly
    pub is_anonymous: bool,
    /// Donor display name as entered at checkout
    pub donor_name: Option<String>,
    /// When the donation reached `confirmed` status
    pub confirmed_at: Option<DateTimeUtc>,
    /// When the donation record was created
    pub created_at: DateTimeUtc,
}

/// Settlement states a donation moves through
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    /// Recorded but not yet settled
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled, counts toward campaign aggregates
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Confirmed and later returned to the donor
    #[sea_orm(string_value = "refunded")]
    Refunded,
    /// Never settled
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Donations reference campaigns only by id, never through database-level
/// foreign keys, so donations may point at campaigns that do not exist yet.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
