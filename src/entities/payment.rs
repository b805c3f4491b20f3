//! Payment entity - One row per processor payment, used for idempotency.
//!
//! The primary key is derived from the processor name and the processor's
//! payment intent id, so replayed confirmations for the same payment land on
//! the same row instead of creating duplicates. The recorder only increments
//! campaign aggregates on the row's first transition into `succeeded`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Deterministic key: `{provider}_{payment_intent_id}`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Payment processor that produced the confirmation (currently "stripe")
    pub provider: String,
    /// Id of the campaign the payment funds
    pub campaign_id: String,
    /// Paid amount in major currency units
    pub amount: f64,
    /// Paid amount in minor units as reported by the processor, when available
    pub amount_minor: Option<i64>,
    /// ISO 4217 currency code reported by the processor
    pub currency: String,
    /// Processor status string, e.g. "succeeded" or "processing"
    pub status: String,
    /// Donor display name assembled from the checkout form, when given
    pub donor_name: Option<String>,
    /// When the payment was first seen
    pub created_at: DateTimeUtc,
    /// When the payment was last written
    pub updated_at: DateTimeUtc,
}

/// Payments reference campaigns only by id, never through database-level
/// foreign keys, so confirmations may arrive before their campaign exists.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
