//! Payment confirmation recording - exactly-once campaign increments.
//!
//! Payment processors redeliver webhooks, so the recorder keys every payment
//! by `{provider}_{payment_intent_id}` and upserts that row on each delivery.
//! Campaign totals move only when a delivery takes the row into `succeeded`
//! from some other stored status; replays merely refresh the payment row.
//! When a confirmation references a campaign that does not exist yet, a
//! placeholder campaign is created inside the same transaction so the
//! increment is never lost.

use crate::{
    core::retry_on_conflict,
    entities::{Campaign, CampaignStatus, LastDonors, Payment, campaign, payment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// The only payment processor currently accepted
pub const RECOGNIZED_PROVIDER: &str = "stripe";

/// Processor status that marks a payment as settled
pub const PAYMENT_SUCCEEDED: &str = "succeeded";

/// One processor confirmation, as decoded from the webhook payload
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    /// Payment processor that sent the confirmation
    pub provider: String,
    /// Processor-side payment intent id
    pub payment_intent_id: String,
    /// Processor status string, e.g. "succeeded" or "processing"
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
    /// Donor display name assembled by the intake layer
    pub donor_name: Option<String>,
}

/// Deterministic payment row key shared by every redelivery of one payment.
#[must_use]
pub fn payment_record_id(provider: &str, payment_intent_id: &str) -> String {
    format!("{provider}_{payment_intent_id}")
}

/// Records one processor confirmation and settles the campaign increment.
///
/// The payment row is upserted merge-style: `created_at` and any field the
/// new confirmation omits are preserved from the stored row. The campaign's
/// `total_donated` and `donors_count` move by exactly one payment the first
/// time the stored status becomes [`PAYMENT_SUCCEEDED`].
///
/// # Errors
/// Returns a validation error when the provider is not recognized, the
/// payment intent id is blank, no campaign is referenced, or the amount is
/// not a finite positive number. Nothing is written in those cases.
pub async fn record_payment_confirmation(
    db: &DatabaseConnection,
    confirmation: &PaymentConfirmation,
) -> Result<()> {
    let campaign_id = validate(confirmation)?;
    let record_id = payment_record_id(&confirmation.provider, &confirmation.payment_intent_id);
    let record_ref: &str = &record_id;
    retry_on_conflict(move || record_once(db, confirmation, record_ref, campaign_id)).await
}

/// Checks the fields the recorder refuses to act without.
///
/// Returns the campaign reference to charge: `campaign_id` when present and
/// non-empty, otherwise `campaign_slug`.
fn validate(confirmation: &PaymentConfirmation) -> Result<&str> {
    if confirmation.provider != RECOGNIZED_PROVIDER {
        return Err(Error::Validation {
            message: format!(
                "unrecognized payment provider '{}'",
                confirmation.provider
            ),
        });
    }
    if confirmation.payment_intent_id.trim().is_empty() {
        return Err(Error::Validation {
            message: "payment intent id is required".to_string(),
        });
    }
    if !confirmation.amount.is_finite() || confirmation.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: confirmation.amount,
        });
    }
    campaign_reference(confirmation).ok_or_else(|| Error::Validation {
        message: "confirmation names no campaign".to_string(),
    })
}

fn campaign_reference(confirmation: &PaymentConfirmation) -> Option<&str> {
    confirmation
        .campaign_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .or_else(|| {
            confirmation
                .campaign_slug
                .as_deref()
                .filter(|slug| !slug.is_empty())
        })
}

async fn record_once(
    db: &DatabaseConnection,
    confirmation: &PaymentConfirmation,
    record_id: &str,
    campaign_id: &str,
) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Payment::find_by_id(record_id).one(&txn).await?;
    let campaign_exists = Campaign::find_by_id(campaign_id)
        .one(&txn)
        .await?
        .is_some();

    let already_succeeded = existing
        .as_ref()
        .is_some_and(|p| p.status == PAYMENT_SUCCEEDED);
    let now = Utc::now();

    match existing {
        Some(model) => {
            let mut active: payment::ActiveModel = model.into();
            active.provider = Set(confirmation.provider.clone());
            active.campaign_id = Set(campaign_id.to_string());
            active.amount = Set(confirmation.amount);
            active.currency = Set(confirmation.currency.clone());
            active.status = Set(confirmation.status.clone());
            if confirmation.amount_minor.is_some() {
                active.amount_minor = Set(confirmation.amount_minor);
            }
            if confirmation.donor_name.is_some() {
                active.donor_name = Set(confirmation.donor_name.clone());
            }
            active.updated_at = Set(now);
            active.update(&txn).await?;
        }
        None => {
            payment::ActiveModel {
                id: Set(record_id.to_string()),
                provider: Set(confirmation.provider.clone()),
                campaign_id: Set(campaign_id.to_string()),
                amount: Set(confirmation.amount),
                amount_minor: Set(confirmation.amount_minor),
                currency: Set(confirmation.currency.clone()),
                status: Set(confirmation.status.clone()),
                donor_name: Set(confirmation.donor_name.clone()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }
    }

    if confirmation.status == PAYMENT_SUCCEEDED && !already_succeeded {
        if !campaign_exists {
            info!("campaign '{campaign_id}' missing, creating placeholder for payment increment");
            Campaign::insert(placeholder_campaign(campaign_id, now))
                .on_conflict(
                    OnConflict::column(campaign::Column::Id)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;
        }
        Campaign::update_many()
            .col_expr(
                campaign::Column::TotalDonated,
                Expr::col(campaign::Column::TotalDonated).add(confirmation.amount),
            )
            .col_expr(
                campaign::Column::DonorsCount,
                Expr::col(campaign::Column::DonorsCount).add(1),
            )
            .col_expr(campaign::Column::UpdatedAt, Expr::value(now))
            .filter(campaign::Column::Id.eq(campaign_id))
            .exec(&txn)
            .await?;
        debug!("counted payment '{record_id}' toward campaign '{campaign_id}'");
    }

    txn.commit().await?;
    Ok(())
}

/// Zero-valued campaign shell, inserted when a payment arrives for a
/// campaign id the store has never seen.
fn placeholder_campaign(campaign_id: &str, now: DateTimeUtc) -> campaign::ActiveModel {
    campaign::ActiveModel {
        id: Set(campaign_id.to_string()),
        title: Set(None),
        goal: Set(None),
        status: Set(CampaignStatus::Draft),
        total_donated: Set(0.0),
        donors_count: Set(0),
        last_donors: Set(LastDonors::default()),
        end_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
