//! Reactive campaign aggregation - folds donation writes into campaign totals.
//!
//! Every donation write is announced as a (before, after) snapshot pair on the
//! donation change feed. [`apply_donation_change`] turns that pair into an
//! incremental update of the owning campaign: a signed amount delta, a donor
//! count transition, and a recent-donor list edit, all applied in a single
//! database transaction.
//!
//! The increments are deliberately tolerant: changes for unknown campaigns or
//! unattributed donations are skipped, duplicate or out-of-order deliveries
//! can leave small drift in the totals, and the recent-donor list is only
//! edited best effort. The recompute sweep rebuilds exact values from the
//! donation table whenever an operator asks.

use crate::{
    core::retry_on_conflict,
    entities::{Campaign, DonationStatus, DonorEntry, LastDonors, campaign, donation},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::debug;

/// Maximum entries kept in a campaign's recent-donor list
pub const LAST_DONORS_CAP: usize = 15;

/// Display name used when the donor asked to stay anonymous
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Display name used when no donor name was captured
pub const UNNAMED_DONOR: &str = "Donor";

/// Donation fields the aggregator consumes, captured at a point in time.
///
/// The intake layer records one snapshot before and one after every donation
/// write and hands the pair to [`apply_donation_change`]. A missing snapshot
/// means the donation did not exist on that side of the write.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationSnapshot {
    /// Id of the campaign the donation was attributed to
    pub campaign_id: Option<String>,
    /// Settlement state at capture time
    pub status: DonationStatus,
    /// Donated amount in major currency units
    pub amount: f64,
    /// Whether the donor asked not to be named publicly
    pub is_anonymous: bool,
    /// Donor display name as entered at checkout
    pub donor_name: Option<String>,
    /// When the donation reached `confirmed` status, if it has
    pub confirmed_at: Option<DateTimeUtc>,
    /// When the donation record was created
    pub created_at: DateTimeUtc,
}

impl From<&donation::Model> for DonationSnapshot {
    fn from(model: &donation::Model) -> Self {
        Self {
            campaign_id: model.campaign_id.clone(),
            status: model.status,
            amount: model.amount,
            is_anonymous: model.is_anonymous,
            donor_name: model.donor_name.clone(),
            confirmed_at: model.confirmed_at,
            created_at: model.created_at,
        }
    }
}

impl From<donation::Model> for DonationSnapshot {
    fn from(model: donation::Model) -> Self {
        Self::from(&model)
    }
}

/// Applies one donation write to the aggregates of its campaign.
///
/// Only the `confirmed` status counts: the amount delta is the difference
/// between the confirmed amounts of the two snapshots, the donor count moves
/// by one on a transition into or out of `confirmed` (never below zero), and
/// the recent-donor list gains an entry on confirmation or loses its matching
/// entry on un-confirmation. The campaign row is rewritten on every
/// attributable event, even when nothing but `updated_at` changes.
///
/// Changes with no campaign reference, or referencing a campaign that does
/// not exist, are skipped without error. Transient write conflicts are
/// retried internally.
///
/// # Errors
/// Returns an error when the database rejects the transaction for any
/// non-transient reason.
pub async fn apply_donation_change(
    db: &DatabaseConnection,
    before: Option<&DonationSnapshot>,
    after: Option<&DonationSnapshot>,
) -> Result<()> {
    if before.is_none() && after.is_none() {
        return Ok(());
    }
    retry_on_conflict(move || apply_once(db, before, after)).await
}

async fn apply_once(
    db: &DatabaseConnection,
    before: Option<&DonationSnapshot>,
    after: Option<&DonationSnapshot>,
) -> Result<()> {
    let Some(campaign_id) = campaign_ref(before, after) else {
        debug!("donation change carries no campaign reference, skipping");
        return Ok(());
    };

    let txn = db.begin().await?;

    let Some(campaign) = Campaign::find_by_id(campaign_id).one(&txn).await? else {
        debug!("campaign '{campaign_id}' not found, skipping donation change");
        return Ok(());
    };

    let was_confirmed = is_confirmed(before);
    let now_confirmed = is_confirmed(after);
    let delta = confirmed_amount(after) - confirmed_amount(before);
    let now = Utc::now();

    let total_donated = campaign.total_donated + delta;
    let mut donors_count = campaign.donors_count;
    let mut entries = campaign.last_donors.0.clone();

    if now_confirmed && !was_confirmed {
        donors_count += 1;
        if let Some(snapshot) = after {
            entries.insert(0, donor_entry(snapshot));
            entries.truncate(LAST_DONORS_CAP);
        }
    } else if was_confirmed && !now_confirmed {
        donors_count = (donors_count - 1).max(0);
        if let Some(snapshot) = before {
            // Best effort: the entry is gone only if name, amount, and
            // timestamp all still match what was recorded on confirmation.
            let target = donor_entry(snapshot);
            if let Some(position) = entries.iter().position(|entry| *entry == target) {
                entries.remove(position);
            }
        }
    }

    let mut active: campaign::ActiveModel = campaign.into();
    active.total_donated = Set(total_donated);
    active.donors_count = Set(donors_count);
    active.last_donors = Set(LastDonors(entries));
    active.updated_at = Set(now);
    active.update(&txn).await?;

    txn.commit().await?;
    debug!("applied donation change to campaign '{campaign_id}' (delta: {delta})");
    Ok(())
}

/// Picks the campaign the change applies to: the after snapshot wins, the
/// before snapshot is the fallback, and empty ids count as absent.
fn campaign_ref<'a>(
    before: Option<&'a DonationSnapshot>,
    after: Option<&'a DonationSnapshot>,
) -> Option<&'a str> {
    after
        .and_then(|s| s.campaign_id.as_deref())
        .filter(|id| !id.is_empty())
        .or_else(|| {
            before
                .and_then(|s| s.campaign_id.as_deref())
                .filter(|id| !id.is_empty())
        })
}

fn is_confirmed(snapshot: Option<&DonationSnapshot>) -> bool {
    snapshot.is_some_and(|s| s.status == DonationStatus::Confirmed)
}

fn confirmed_amount(snapshot: Option<&DonationSnapshot>) -> f64 {
    match snapshot {
        Some(s) if s.status == DonationStatus::Confirmed => s.amount,
        _ => 0.0,
    }
}

/// Builds the recent-donor entry for a snapshot. Anonymous donations show
/// [`ANONYMOUS_DONOR`], blank names fall back to [`UNNAMED_DONOR`]. The entry
/// timestamp is the confirmation time, falling back to the donation's
/// creation time so insertion and removal derive the same value.
fn donor_entry(snapshot: &DonationSnapshot) -> DonorEntry {
    let name = if snapshot.is_anonymous {
        ANONYMOUS_DONOR.to_string()
    } else {
        match snapshot.donor_name.as_deref().map(str::trim) {
            Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
            _ => UNNAMED_DONOR.to_string(),
        }
    };
    DonorEntry {
        name,
        amount: snapshot.amount,
        at: snapshot.confirmed_at.unwrap_or(snapshot.created_at),
    }
}
